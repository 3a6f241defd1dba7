//! Weighted quick-union with path compression.

/// Disjoint sets over `0..n`.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    count: usize,
}

impl UnionFind {
    /// `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            count: n,
        }
    }

    /// Number of disjoint sets.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Representative of the set holding `p`.
    pub fn find(&mut self, p: usize) -> usize {
        let mut root = p;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = p;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn connected(&mut self, p: usize, q: usize) -> bool {
        self.find(p) == self.find(q)
    }

    /// Merge the sets holding `p` and `q`. Returns the new representative.
    pub fn union(&mut self, p: usize, q: usize) -> usize {
        let (rp, rq) = (self.find(p), self.find(q));
        if rp == rq {
            return rp;
        }
        self.count -= 1;
        if self.size[rp] < self.size[rq] {
            self.parent[rp] = rq;
            self.size[rq] += self.size[rp];
            rq
        } else {
            self.parent[rq] = rp;
            self.size[rp] += self.size[rq];
            rp
        }
    }

    /// Members of every set, each sorted, sets ordered by smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); self.parent.len()];
        let mut order = Vec::new();
        for p in 0..self.parent.len() {
            let root = self.find(p);
            if by_root[root].is_empty() {
                order.push(root);
            }
            by_root[root].push(p);
        }
        order
            .into_iter()
            .map(|root| std::mem::take(&mut by_root[root]))
            .collect()
    }
}
