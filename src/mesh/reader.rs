//! Parsers for the ASCII mesh files of a FESOM2 mesh directory.

use crate::errors::{FesomError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const NOD2D_FILE: &str = "nod2d.out";
pub const ELEM2D_FILE: &str = "elem2d.out";
pub const AUX3D_FILE: &str = "aux3d.out";

/// Raw contents of `nod2d.out`, coordinates still in the model frame.
#[derive(Debug, Clone)]
pub struct RawNodes {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub flags: Vec<i32>,
}

/// Raw contents of `aux3d.out`, signs removed.
#[derive(Debug, Clone)]
pub struct RawLevels {
    pub zlev: Vec<f64>,
    pub topo: Option<Vec<f64>>,
}

/// Whitespace token stream that remembers line numbers for error messages.
struct Tokens<'a> {
    file: PathBuf,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pending: Vec<&'a str>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(file: &Path, content: &'a str) -> Self {
        Self {
            file: file.to_path_buf(),
            lines: content.lines().enumerate(),
            pending: Vec::new(),
            line: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> FesomError {
        FesomError::MeshParse {
            file: self.file.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    /// Next non-empty line, split into tokens.
    fn next_line(&mut self) -> Option<Vec<&'a str>> {
        for (idx, line) in self.lines.by_ref() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if !tokens.is_empty() {
                self.line = idx + 1;
                return Some(tokens);
            }
        }
        None
    }

    /// Next single token, crossing line boundaries.
    fn next_token(&mut self) -> Option<&'a str> {
        while self.pending.is_empty() {
            let mut tokens = self.next_line()?;
            tokens.reverse();
            self.pending = tokens;
        }
        self.pending.pop()
    }

    fn parse<T: FromStr>(&self, token: &str, what: &str) -> Result<T> {
        token
            .parse::<T>()
            .map_err(|_| self.error(format!("invalid {what} '{token}'")))
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let token = self
            .next_token()
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        self.parse(token, what)
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Parse `nod2d.out`: a node count followed by `index lon lat flag` rows.
pub fn read_nodes(dir: &Path) -> Result<RawNodes> {
    let path = dir.join(NOD2D_FILE);
    let content = read(&path)?;
    let mut tokens = Tokens::new(&path, &content);

    let n2d = tokens.count("node count")?;
    let mut nodes = RawNodes {
        lon: Vec::with_capacity(n2d),
        lat: Vec::with_capacity(n2d),
        flags: Vec::with_capacity(n2d),
    };

    for i in 0..n2d {
        let row = tokens
            .next_line()
            .ok_or_else(|| tokens.error(format!("expected {n2d} nodes, found {i}")))?;
        if row.len() < 3 {
            return Err(tokens.error("node row needs at least index, lon and lat"));
        }
        nodes.lon.push(tokens.parse(row[1], "longitude")?);
        nodes.lat.push(tokens.parse(row[2], "latitude")?);
        let flag = match row.get(3) {
            Some(token) => tokens.parse(token, "node flag")?,
            None => 0,
        };
        nodes.flags.push(flag);
    }

    Ok(nodes)
}

/// Parse `elem2d.out`: an element count followed by one-based node triplets.
///
/// Indices are returned zero-based and checked against `n2d`.
pub fn read_elements(dir: &Path, n2d: usize) -> Result<Vec<[usize; 3]>> {
    let path = dir.join(ELEM2D_FILE);
    let content = read(&path)?;
    let mut tokens = Tokens::new(&path, &content);

    let e2d = tokens.count("element count")?;
    let mut elements = Vec::with_capacity(e2d);

    for i in 0..e2d {
        let row = tokens
            .next_line()
            .ok_or_else(|| tokens.error(format!("expected {e2d} elements, found {i}")))?;
        if row.len() < 3 {
            return Err(tokens.error("element row needs three node indices"));
        }
        let mut elem = [0usize; 3];
        for (slot, token) in elem.iter_mut().zip(&row[..3]) {
            let index: usize = tokens.parse(token, "node index")?;
            if index == 0 || index > n2d {
                return Err(tokens.error(format!("node index {index} outside 1..={n2d}")));
            }
            *slot = index - 1;
        }
        elements.push(elem);
    }

    Ok(elements)
}

/// Parse `aux3d.out`: a level count, the level depths, then optionally one
/// bottom depth per node.
pub fn read_levels(dir: &Path, n2d: usize) -> Result<RawLevels> {
    let path = dir.join(AUX3D_FILE);
    let content = read(&path)?;
    let mut tokens = Tokens::new(&path, &content);

    let nlev = tokens.count("level count")?;
    let mut zlev = Vec::with_capacity(nlev);
    for i in 0..nlev {
        let token = tokens
            .next_token()
            .ok_or_else(|| tokens.error(format!("expected {nlev} levels, found {i}")))?;
        let depth: f64 = tokens.parse(token, "level depth")?;
        zlev.push(depth.abs());
    }
    if zlev.windows(2).any(|w| w[1] <= w[0]) {
        return Err(tokens.error("depth levels must increase strictly from the surface"));
    }

    let mut topo = Vec::with_capacity(n2d);
    while let Some(token) = tokens.next_token() {
        let depth: f64 = tokens.parse(token, "bottom depth")?;
        topo.push(depth.abs());
    }
    let topo = match topo.len() {
        0 => None,
        n if n == n2d => Some(topo),
        n => {
            return Err(tokens.error(format!(
                "expected {n2d} bottom depths after the levels, found {n}"
            )))
        }
    };

    Ok(RawLevels { zlev, topo })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn levels_lose_their_sign() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(AUX3D_FILE), "3\n0\n-10\n-25\n-20\n-5\n").unwrap();
        let levels = read_levels(dir.path(), 2).unwrap();
        assert_eq!(levels.zlev, vec![0.0, 10.0, 25.0]);
        assert_eq!(levels.topo, Some(vec![20.0, 5.0]));
    }

    #[test]
    fn non_monotonic_levels_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(AUX3D_FILE), "3\n0\n20\n10\n").unwrap();
        assert!(matches!(
            read_levels(dir.path(), 0),
            Err(FesomError::MeshParse { .. })
        ));
    }

    #[test]
    fn element_index_out_of_range() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(ELEM2D_FILE), "1\n1 2 4\n").unwrap();
        match read_elements(dir.path(), 3) {
            Err(FesomError::MeshParse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("node index 4"));
            }
            other => panic!("Expected MeshParse error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_node_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(NOD2D_FILE), "3\n1 0.0 0.0 0\n2 1.0 0.0 0\n").unwrap();
        assert!(read_nodes(dir.path()).is_err());
    }
}
