use std::{
    collections::{HashSet, VecDeque},
    fs::File,
    io::{self, BufWriter},
    path::Path,
    time::{Duration, Instant},
};

use rayon::prelude::*;
use serde::Serialize;
use sparseset::SparseSet;

use crate::{
    config::LinkConfig,
    error::{Result, VectorizerError},
    utils::math::sparse_dot,
    vectorizer::{encoder::SparseVector, vocabulary::Vocabulary, VECTORS_HEADER},
};

/// Header of the neighbors table.
pub const NEIGHBORS_HEADER: [&str; 3] = ["index", "neighbor", "distance"];

/// Closest earlier vector of a vector. A vector without one is its own
/// neighbor at distance 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub index: usize,
    pub neighbor: usize,
    pub distance: f64,
}

impl Neighbor {
    fn own(index: usize) -> Self {
        Self {
            index,
            neighbor: index,
            distance: 0.0,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.neighbor != self.index
    }
}

/// Online nearest neighbor search over a sliding window of vectors.
///
/// Vectors are pushed in table order. Each one is compared with the earlier
/// vectors of the window sharing one of its `query_size` heaviest dimensions,
/// found through an inverted index (dimension -> indices in push order).
/// Vectors must be L2 normalized for the distance to be a cosine distance.
pub struct NeighborLinker {
    config: LinkConfig,
    dimensions: usize,
    /// weights of the vector being searched, keyed by dimension
    query: SparseSet<f64>,
    inverted_index: SparseSet<VecDeque<usize>>,
    window: VecDeque<SparseVector>,
    candidates: HashSet<usize>,
    /// vectors already dropped from the front of the window
    evicted: usize,
    next: usize,
}

impl NeighborLinker {
    /// `dimensions` is the vocabulary size of the table being linked.
    pub fn new(dimensions: usize, config: LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dimensions,
            query: SparseSet::with_capacity(dimensions),
            inverted_index: SparseSet::with_capacity(dimensions),
            window: VecDeque::new(),
            candidates: HashSet::new(),
            evicted: 0,
            next: 0,
        })
    }

    /// number of vectors pushed so far
    pub fn len(&self) -> usize {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    /// Find the neighbor of `vector`, then add it to the window.
    /// Fails, leaving the linker untouched, on a dimension outside the vocabulary.
    pub fn push(&mut self, vector: SparseVector) -> std::result::Result<Neighbor, String> {
        if let Some(dim) = vector.dims.iter().find(|&&dim| dim as usize >= self.dimensions) {
            return Err(format!(
                "dimension {dim} outside a vocabulary of {} tokens",
                self.dimensions
            ));
        }
        let index = self.next;
        self.next += 1;

        let neighbor = if vector.is_empty() {
            Neighbor::own(index)
        } else {
            self.search(index, &vector)
        };
        self.admit(index, vector);
        Ok(neighbor)
    }

    fn search(&mut self, index: usize, vector: &SparseVector) -> Neighbor {
        self.query.clear();
        for (dim, weight) in vector.iter() {
            self.query.insert(dim as usize, weight);
        }
        for &dim in vector.dims.iter().take(self.config.query_size) {
            if let Some(postings) = self.inverted_index.get(dim as usize) {
                self.candidates.extend(postings.iter().copied());
            }
        }

        let query = &self.query;
        let window = &self.window;
        let evicted = self.evicted;
        let threshold = self.config.threshold;
        let best = self
            .candidates
            .par_iter()
            .filter_map(|&candidate| {
                let other = window.get(candidate.checked_sub(evicted)?)?;
                Some((candidate, cosine_distance(query, other)))
            })
            .filter(|&(_, distance)| distance < threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        self.candidates.clear();

        match best {
            Some((neighbor, distance)) => Neighbor {
                index,
                neighbor,
                distance,
            },
            None => Neighbor::own(index),
        }
    }

    fn admit(&mut self, index: usize, vector: SparseVector) {
        for &dim in &vector.dims {
            let dim = dim as usize;
            if !self.inverted_index.contains(dim) {
                self.inverted_index.insert(dim, VecDeque::new());
            }
            if let Some(postings) = self.inverted_index.get_mut(dim) {
                postings.push_back(index);
            }
        }
        self.window.push_back(vector);

        if self.window.len() > self.config.window {
            if let Some(oldest) = self.window.pop_front() {
                // the oldest vector is at the front of each of its postings
                for &dim in &oldest.dims {
                    if let Some(postings) = self.inverted_index.get_mut(dim as usize) {
                        postings.pop_front();
                    }
                }
                self.evicted += 1;
            }
        }
    }
}

/// `1 - dot`, clamped at 0 against rounding.
fn cosine_distance(query: &SparseSet<f64>, other: &SparseVector) -> f64 {
    let dot = sparse_dot(
        |dim| query.get(dim).copied(),
        other.iter().map(|(dim, weight)| (dim as usize, weight)),
    );
    (1.0 - dot).max(0.0)
}

/// Counters of a finished `link` run.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSummary {
    pub vectors: usize,
    /// vectors with a neighbor other than themselves
    pub linked: usize,
    pub elapsed: Duration,
}

/// Link the vectors table at `vectors` and write the neighbors table to
/// `output`. The dimension count comes from the vocabulary of the run that
/// produced the table.
pub fn run_link(
    vectors: &Path,
    vocabulary: &Path,
    output: &Path,
    config: &LinkConfig,
) -> Result<LinkSummary> {
    config.validate()?;
    let dimensions = Vocabulary::load(vocabulary)?.len();
    let input = File::open(vectors).map_err(|source| VectorizerError::input_io(vectors, source))?;
    let sink = File::create(output).map_err(|source| VectorizerError::output_io(output, source))?;
    let summary = link_tables(input, vectors, BufWriter::new(sink), output, dimensions, config)?;
    log::info!(
        "linked {} of {} vectors in {:.2}s",
        summary.linked,
        summary.vectors,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

/// Stream a vectors table through a [`NeighborLinker`].
///
/// Any malformed row aborts the pass, since a skipped row would shift every
/// later index.
pub fn link_tables<R, W>(
    reader: R,
    source: &Path,
    writer: W,
    sink: &Path,
    dimensions: usize,
    config: &LinkConfig,
) -> Result<LinkSummary>
where
    R: io::Read,
    W: io::Write,
{
    let start = Instant::now();
    let mut linker = NeighborLinker::new(dimensions, config.clone())?;

    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|err| VectorizerError::from_input_csv(source, err))?;
    if !headers.iter().eq(VECTORS_HEADER) {
        return Err(VectorizerError::RowDecode {
            row: 1,
            reason: format!("expected header {}", VECTORS_HEADER.join(",")),
        });
    }

    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(NEIGHBORS_HEADER)
        .map_err(|err| VectorizerError::from_output_csv(sink, err))?;

    let mut linked = 0;
    let limit = config.limit.unwrap_or(usize::MAX);
    for record in rdr.records().take(limit) {
        let record = record.map_err(|err| VectorizerError::from_input_csv(source, err))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row_err = |reason: String| VectorizerError::RowDecode { row: line, reason };

        let (dims, weights) = match (record.get(0), record.get(1)) {
            (Some(dims), Some(weights)) => (dims, weights),
            _ => return Err(row_err(format!("expected 2 fields, found {}", record.len()))),
        };
        let vector = SparseVector::parse(dims, weights).map_err(row_err)?;
        let neighbor = linker.push(vector).map_err(row_err)?;
        if neighbor.is_linked() {
            linked += 1;
        }
        wtr.serialize(neighbor)
            .map_err(|err| VectorizerError::from_output_csv(sink, err))?;

        if config.progress_every > 0 && linker.len() % config.progress_every == 0 {
            log::info!("linked {} vectors | {} with a neighbor", linker.len(), linked);
        }
    }
    wtr.flush()
        .map_err(|source| VectorizerError::output_io(sink, source))?;

    Ok(LinkSummary {
        vectors: linker.len(),
        linked,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LinkConfig {
        LinkConfig {
            progress_every: 0,
            ..LinkConfig::default()
        }
    }

    fn vector(pairs: &[(u32, f64)]) -> SparseVector {
        SparseVector::from_pairs(pairs.to_vec())
    }

    #[test]
    fn identical_vectors_link_to_the_first() {
        let mut linker = NeighborLinker::new(4, config()).unwrap();
        let a = vector(&[(0, 0.8), (1, 0.6)]);
        assert_eq!(linker.push(a.clone()).unwrap(), Neighbor::own(0));
        let second = linker.push(a.clone()).unwrap();
        assert_eq!(second.neighbor, 0);
        assert!(second.distance < 1e-9);
        // equal distances, smaller index wins
        let third = linker.push(a).unwrap();
        assert_eq!(third.neighbor, 0);
    }

    #[test]
    fn disjoint_vectors_stay_alone() {
        let mut linker = NeighborLinker::new(4, config()).unwrap();
        linker.push(vector(&[(0, 1.0)])).unwrap();
        let n = linker.push(vector(&[(1, 1.0)])).unwrap();
        assert!(!n.is_linked());
        assert_eq!(n.distance, 0.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let pair = [vector(&[(0, s), (1, s)]), vector(&[(0, 1.0)])];

        let mut linker = NeighborLinker::new(2, config()).unwrap();
        linker.push(pair[0].clone()).unwrap();
        let n = linker.push(pair[1].clone()).unwrap();
        assert_eq!(n.neighbor, 0);
        assert!((n.distance - (1.0 - s)).abs() < 1e-12);

        let strict = LinkConfig {
            threshold: 0.2,
            ..config()
        };
        let mut linker = NeighborLinker::new(2, strict).unwrap();
        linker.push(pair[0].clone()).unwrap();
        assert!(!linker.push(pair[1].clone()).unwrap().is_linked());
    }

    #[test]
    fn closest_candidate_wins() {
        let mut linker = NeighborLinker::new(3, config()).unwrap();
        linker.push(vector(&[(0, 0.6), (2, 0.8)])).unwrap();
        linker.push(vector(&[(0, 0.8), (1, 0.6)])).unwrap();
        let n = linker.push(vector(&[(0, 0.8), (1, 0.6)])).unwrap();
        assert_eq!(n.neighbor, 1);
    }

    #[test]
    fn evicted_vectors_are_forgotten() {
        let window = LinkConfig {
            window: 1,
            ..config()
        };
        let mut linker = NeighborLinker::new(4, window).unwrap();
        linker.push(vector(&[(0, 1.0)])).unwrap();
        linker.push(vector(&[(1, 1.0)])).unwrap();
        assert!(!linker.push(vector(&[(0, 1.0)])).unwrap().is_linked());
        assert_eq!(linker.push(vector(&[(0, 1.0)])).unwrap().neighbor, 2);
    }

    #[test]
    fn only_leading_dimensions_gather_candidates() {
        let earlier = vector(&[(3, 1.0)]);
        let query = vector(&[(0, 0.6), (1, 0.5), (3, 0.1)]);

        let narrow = LinkConfig {
            query_size: 2,
            threshold: 1.0,
            ..config()
        };
        let mut linker = NeighborLinker::new(4, narrow).unwrap();
        linker.push(earlier.clone()).unwrap();
        assert!(!linker.push(query.clone()).unwrap().is_linked());

        let wide = LinkConfig {
            query_size: 3,
            threshold: 1.0,
            ..config()
        };
        let mut linker = NeighborLinker::new(4, wide).unwrap();
        linker.push(earlier).unwrap();
        assert_eq!(linker.push(query).unwrap().neighbor, 0);
    }

    #[test]
    fn empty_vectors_are_not_indexed() {
        let mut linker = NeighborLinker::new(2, config()).unwrap();
        assert_eq!(linker.push(SparseVector::empty()).unwrap(), Neighbor::own(0));
        assert_eq!(linker.push(SparseVector::empty()).unwrap(), Neighbor::own(1));
        assert_eq!(linker.len(), 2);
    }

    #[test]
    fn out_of_vocabulary_dimension_is_rejected() {
        let mut linker = NeighborLinker::new(2, config()).unwrap();
        assert!(linker.push(vector(&[(2, 1.0)])).is_err());
        assert!(linker.is_empty());
    }

    fn link_str(table: &str, dimensions: usize) -> Result<(LinkSummary, String)> {
        let mut out = Vec::new();
        let summary = link_tables(
            table.as_bytes(),
            Path::new("vectors.csv"),
            &mut out,
            Path::new("neighbors.csv"),
            dimensions,
            &config(),
        )?;
        Ok((summary, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn tables_in_tables_out() {
        let table = "dimensions,weights\n1|0,0.8|0.6\n,\n1|0,0.8|0.6\n2,1.0\n";
        let (summary, out) = link_str(table, 3).unwrap();
        assert_eq!(summary.vectors, 4);
        assert_eq!(summary.linked, 1);

        let mut rdr = csv::Reader::from_reader(out.as_bytes());
        assert!(rdr.headers().unwrap().iter().eq(NEIGHBORS_HEADER));
        let rows: Vec<(usize, usize)> = rdr
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].parse().unwrap(), r[1].parse().unwrap())
            })
            .collect();
        assert_eq!(rows, vec![(0, 0), (1, 1), (2, 0), (3, 3)]);
    }

    #[test]
    fn malformed_rows_abort_the_pass() {
        let bad_weight = link_str("dimensions,weights\n0,abc\n", 2).unwrap_err();
        assert!(matches!(bad_weight, VectorizerError::RowDecode { row: 2, .. }));

        let out_of_range = link_str("dimensions,weights\n0,1.0\n5,1.0\n", 2).unwrap_err();
        assert!(matches!(out_of_range, VectorizerError::RowDecode { row: 3, .. }));

        let repeated = link_str("dimensions,weights\n1|1,0.5|0.5\n", 2).unwrap_err();
        assert!(matches!(repeated, VectorizerError::RowDecode { row: 2, .. }));

        let wrong_header = link_str("a,b\n0,1.0\n", 2).unwrap_err();
        assert!(matches!(wrong_header, VectorizerError::RowDecode { row: 1, .. }));
    }

    #[test]
    fn empty_table_writes_the_header() {
        let (summary, out) = link_str("dimensions,weights\n", 0).unwrap();
        assert_eq!(summary.vectors, 0);
        assert_eq!(out.lines().collect::<Vec<_>>(), vec!["index,neighbor,distance"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = LinkConfig {
            window: 0,
            ..config()
        };
        assert!(matches!(
            NeighborLinker::new(2, bad),
            Err(VectorizerError::InvalidConfig(_))
        ));
    }
}
