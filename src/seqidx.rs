use noodles::sam;
use rustc_hash::FxHashMap;

/// Reference-sequence table extracted from a SAM header: names and lengths
/// in header order, with a name -> id lookup. Ids are dense and equal to the
/// position of the `@SQ` line in the header.
#[derive(Clone, Debug, Default)]
pub struct SequenceIndex {
    names: Vec<String>,
    lengths: Vec<u32>,
    name_to_id: FxHashMap<String, u32>,
}

impl SequenceIndex {
    pub fn from_header(header: &sam::Header) -> Self {
        let mut names = Vec::with_capacity(header.reference_sequences().len());
        let mut lengths = Vec::with_capacity(header.reference_sequences().len());
        let mut name_to_id = FxHashMap::default();

        for (name, reference) in header.reference_sequences() {
            let name = String::from_utf8_lossy(name).into_owned();
            name_to_id.insert(name.clone(), names.len() as u32);
            names.push(name);
            lengths.push(usize::from(reference.length()) as u32);
        }

        SequenceIndex {
            names,
            lengths,
            name_to_id,
        }
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn get_len(&self, id: u32) -> Option<u32> {
        self.lengths.get(id as usize).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
