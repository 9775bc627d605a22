//! Pre-packed codes for the handful of categories the refinement rules key on.

use crate::classificator::{code, ClassifError, ClassifTree};

/// Looked up once per tree so refinement never walks the tree per element.
///
/// All of these paths are required; a tree missing one is structurally broken
/// for this pipeline and is rejected at construction time.
pub struct CachedTypes {
    pub entrance: u32,
    pub highway: u32,
    pub address: u32,
    pub oneway: u32,
    pub private: u32,
    pub lit: u32,
    pub nofoot: u32,
    pub yesfoot: u32,
    pub rw_station: u32,
    pub rw_subway: u32,
}

impl CachedTypes {
    pub fn new(tree: &ClassifTree) -> Result<Self, ClassifError> {
        let get = |path: &[&str]| {
            tree.type_by_path(path)
                .ok_or_else(|| ClassifError::MissingType(path.join("|")))
        };

        Ok(CachedTypes {
            entrance: get(&["entrance"])?,
            highway: get(&["highway"])?,
            address: get(&["building", "address"])?,
            oneway: get(&["hwtag", "oneway"])?,
            private: get(&["hwtag", "private"])?,
            lit: get(&["hwtag", "lit"])?,
            nofoot: get(&["hwtag", "nofoot"])?,
            yesfoot: get(&["hwtag", "yesfoot"])?,
            rw_station: get(&["railway", "station"])?,
            rw_subway: get(&["railway", "station", "subway"])?,
        })
    }

    /// Anything below the highway root counts.
    pub fn is_highway(&self, mut packed: u32) -> bool {
        code::trunc(&mut packed, 1);
        packed == self.highway
    }

    /// The generic station type, exactly.
    pub fn is_rw_station(&self, packed: u32) -> bool {
        packed == self.rw_station
    }

    /// Any subway station, including the city-specific subtypes.
    pub fn is_rw_subway(&self, mut packed: u32) -> bool {
        code::trunc(&mut packed, 3);
        packed == self.rw_subway
    }
}
