// All-pairs shortest paths over small dense graphs (Floyd–Warshall).
//
// Puzzle levels hold tens of cells, so the grid keeps a full n×n successor
// matrix per perspective plus one 4n×4n matrix over (cell, perspective)
// nodes. Every query after that is a table lookup: "next hop from i toward
// j" and "is j reachable from i at all".
//
// Edges are unit cost. The solver starts from an `EdgeMatrix` whose entry
// (i, j) is `j` when there is an edge and `NO_PATH` otherwise, and produces
// `PathMatrices` with successors and costs. Costs saturate at `UNREACHABLE`
// so relaxation can never overflow into a bogus shortcut, and relaxation
// uses strict `<`, so among equal-cost routes the one discovered through the
// lowest intermediate index wins.
//
// See also: `grid.rs` which builds the edge matrices from connection tables,
// `route.rs` which walks the successors into full routes.
//
// **Critical constraint: determinism.** Pure function of the edge matrix.

/// Successor entry meaning "no route".
pub const NO_PATH: i32 = -1;

/// Cost entry meaning "no route".
pub const UNREACHABLE: u32 = u32::MAX;

/// Initial adjacency for the solver: entry (i, j) is `j` if there is an edge
/// i → j, else `NO_PATH`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMatrix {
    n: usize,
    next: Vec<i32>,
}

impl EdgeMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            next: vec![NO_PATH; n * n],
        }
    }

    /// Wrap a row-major n×n matrix in the `j`-or-`NO_PATH` encoding.
    ///
    /// Returns `None` if the length is not a perfect square or an entry is
    /// neither `NO_PATH` nor its own column index.
    pub fn from_raw(raw: Vec<i32>) -> Option<Self> {
        let n = (raw.len() as f64).sqrt() as usize;
        if n * n != raw.len() {
            return None;
        }
        let well_formed = raw
            .iter()
            .enumerate()
            .all(|(idx, &v)| v == NO_PATH || v as usize == idx % n);
        well_formed.then_some(Self { n, next: raw })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Add a directed unit edge. Self-loops and out-of-range indices are
    /// ignored.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        if from < self.n && to < self.n && from != to {
            self.next[from * self.n + to] = to as i32;
        }
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        from < self.n && to < self.n && self.next[from * self.n + to] != NO_PATH
    }

    pub fn edge_count(&self) -> usize {
        self.next.iter().filter(|&&v| v != NO_PATH).count()
    }
}

/// All-pairs successor and cost tables produced by `floyd_warshall()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathMatrices {
    n: usize,
    successors: Vec<i32>,
    costs: Vec<u32>,
}

impl PathMatrices {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Raw successor entry: the next node on a shortest route, `NO_PATH` if
    /// there is none, or `from` itself on the diagonal.
    pub fn successor(&self, from: usize, to: usize) -> i32 {
        if from < self.n && to < self.n {
            self.successors[from * self.n + to]
        } else {
            NO_PATH
        }
    }

    /// Raw cost entry, `UNREACHABLE` if there is no route.
    pub fn cost(&self, from: usize, to: usize) -> u32 {
        if from < self.n && to < self.n {
            self.costs[from * self.n + to]
        } else {
            UNREACHABLE
        }
    }

    /// Next node from `from` toward `to`. `None` when unreachable or when
    /// already there.
    pub fn next_hop(&self, from: usize, to: usize) -> Option<usize> {
        if from == to {
            return None;
        }
        match self.successor(from, to) {
            NO_PATH => None,
            s => Some(s as usize),
        }
    }

    /// Route length in edges, or `None` if unreachable.
    pub fn distance(&self, from: usize, to: usize) -> Option<u32> {
        match self.cost(from, to) {
            UNREACHABLE => None,
            c => Some(c),
        }
    }

    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.distance(from, to).is_some()
    }

    /// Full node sequence from `from` to `to`, both inclusive.
    ///
    /// Reconstruction stops after `n` hops, so a corrupted table yields
    /// `None` rather than looping.
    pub fn path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        if !self.is_reachable(from, to) {
            return None;
        }
        let mut nodes = vec![from];
        let mut at = from;
        while at != to {
            if nodes.len() > self.n {
                return None;
            }
            at = self.next_hop(at, to)?;
            nodes.push(at);
        }
        Some(nodes)
    }
}

/// Solve all-pairs shortest paths over unit-cost edges.
pub fn floyd_warshall(edges: &EdgeMatrix) -> PathMatrices {
    let n = edges.n;
    let mut successors = edges.next.clone();
    let mut costs: Vec<u32> = edges
        .next
        .iter()
        .map(|&v| if v == NO_PATH { UNREACHABLE } else { 1 })
        .collect();
    for i in 0..n {
        successors[i * n + i] = i as i32;
        costs[i * n + i] = 0;
    }

    for k in 0..n {
        for i in 0..n {
            let ik = costs[i * n + k];
            if ik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let through = add_costs(ik, costs[k * n + j]);
                if through < costs[i * n + j] {
                    costs[i * n + j] = through;
                    successors[i * n + j] = successors[i * n + k];
                }
            }
        }
    }

    PathMatrices {
        n,
        successors,
        costs,
    }
}

/// Saturating cost addition: anything plus `UNREACHABLE` is `UNREACHABLE`.
fn add_costs(a: u32, b: u32) -> u32 {
    if a == UNREACHABLE || b == UNREACHABLE {
        UNREACHABLE
    } else {
        a.saturating_add(b)
    }
}
