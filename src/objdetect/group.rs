use crate::core::types::Rect;

const EPS: f64 = 0.2;

/// Two rects are similar when every corner pair is within `δ = ε *
/// (min(w)+min(h))/2` of each other. Symmetric by construction.
fn similar(r1: Rect, r2: Rect) -> bool {
    let delta = EPS * f64::from(r1.width.min(r2.width) + r1.height.min(r2.height)) / 2.0;
    let delta = delta.round() as i32;

    (r1.x - r2.x).abs() <= delta
        && (r1.y - r2.y).abs() <= delta
        && ((r1.x + r1.width) - (r2.x + r2.width)).abs() <= delta
        && ((r1.y + r1.height) - (r2.y + r2.height)).abs() <= delta
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

fn round_half_away_from_zero(v: f64) -> i32 {
    if v >= 0.0 {
        (v + 0.5).floor() as i32
    } else {
        (v - 0.5).ceil() as i32
    }
}

/// Union-find rectangle grouper.
///
/// When `min_neighbors <= 0` every raw candidate passes through unmodified
/// — no partitioning, no averaging.
pub fn group_rectangles(rects: &[Rect], min_neighbors: i32) -> Vec<Rect> {
    if min_neighbors <= 0 {
        return rects.to_vec();
    }

    if rects.is_empty() {
        return Vec::new();
    }

    let mut uf = UnionFind::new(rects.len());
    for i in 0..rects.len() {
        for j in 0..i {
            if similar(rects[i], rects[j]) {
                uf.union(i, j);
            }
        }
    }

    let mut root_to_class: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
    let mut members: Vec<Vec<usize>> = Vec::new();

    for i in 0..rects.len() {
        let root = uf.find(i);
        let class_idx = *root_to_class.entry(root).or_insert_with(|| {
            members.push(Vec::new());
            members.len() - 1
        });
        members[class_idx].push(i);
    }

    let mut output = Vec::new();
    for class in &members {
        if class.len() <= min_neighbors as usize {
            continue;
        }

        let n = class.len() as f64;
        let (mut sx, mut sy, mut sw, mut sh) = (0.0, 0.0, 0.0, 0.0);
        for &idx in class {
            let r = rects[idx];
            sx += f64::from(r.x);
            sy += f64::from(r.y);
            sw += f64::from(r.width);
            sh += f64::from(r.height);
        }

        output.push(Rect::new(
            round_half_away_from_zero(sx / n),
            round_half_away_from_zero(sy / n),
            round_half_away_from_zero(sw / n),
            round_half_away_from_zero(sh / n),
        ));
    }

    output
}
