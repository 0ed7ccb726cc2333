//! NCBI-style taxonomy dumps: `names.dmp` (scientific name -> id) and
//! `nodes.dmp` (id -> parent id). Fields are separated by `\t|\t`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use fnv::{FnvHashMap, FnvHashSet};

pub type TaxonId = u32;

#[derive(Debug, Default)]
pub struct Taxonomy {
    names: FnvHashMap<String, TaxonId>,
    parents: FnvHashMap<TaxonId, TaxonId>,
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

impl Taxonomy {
    pub fn from_dumps(names_path: &Path, nodes_path: &Path) -> Result<Taxonomy> {
        let mut taxonomy = Taxonomy::default();

        let names = File::open(names_path)
            .with_context(|| format!("failed to open {}", names_path.display()))?;
        for line in BufReader::new(names).lines() {
            let line = line?;
            let mut fields = line.split("\t|\t");
            let (Some(id), Some(name)) = (fields.next(), fields.next()) else {
                continue;
            };
            let Ok(id) = id.trim().parse::<TaxonId>() else { continue };
            // keep the first entry per name; later rows are synonyms
            taxonomy
                .names
                .entry(normalize_name(name))
                .or_insert(id);
        }

        let nodes = File::open(nodes_path)
            .with_context(|| format!("failed to open {}", nodes_path.display()))?;
        for line in BufReader::new(nodes).lines() {
            let line = line?;
            let mut fields = line.split("\t|\t");
            let (Some(id), Some(parent)) = (fields.next(), fields.next()) else {
                continue;
            };
            let (Ok(id), Ok(parent)) =
                (id.trim().parse::<TaxonId>(), parent.trim().parse::<TaxonId>())
            else {
                continue;
            };
            if id != parent {
                taxonomy.parents.insert(id, parent);
            }
        }

        Ok(taxonomy)
    }

    /// Resolve a scientific name (case-insensitive, spaces or underscores).
    pub fn name_to_id(&self, name: &str) -> Result<TaxonId> {
        match self.names.get(&normalize_name(name)) {
            Some(id) => Ok(*id),
            None => bail!(
                "no scientific name {:?} in the taxonomy; correct the name or pass an id",
                name
            ),
        }
    }

    fn is_descendant(&self, taxon: TaxonId, ancestor: TaxonId) -> bool {
        let mut seen: FnvHashSet<TaxonId> = Default::default();
        let mut current = taxon;
        loop {
            if current == ancestor {
                return true;
            }
            // cycle guard for malformed dumps
            if !seen.insert(current) {
                return false;
            }
            match self.parents.get(&current) {
                Some(parent) => current = *parent,
                None => return false,
            }
        }
    }

    /// Either taxon lies on the other's ancestor chain.
    pub fn related(&self, a: TaxonId, b: TaxonId) -> bool {
        self.is_descendant(a, b) || self.is_descendant(b, a)
    }
}
