use std::fmt;

use super::Matrix;

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format every element first so the columns can be aligned.
        let cells: Vec<String> = (0..self.nrows * self.ncols)
            .map(|k| {
                let (i, j) = (k % self.nrows.max(1), k / self.nrows.max(1));
                format!("{:.6}", self.get(i, j))
            })
            .collect();
        let width = cells.iter().map(String::len).max().unwrap_or(0);

        for i in 0..self.nrows {
            f.write_str(if i == 0 { "[[" } else { " [" })?;
            for j in 0..self.ncols {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{:>width$}", cells[i + j * self.nrows], width = width)?;
            }
            f.write_str(if i + 1 == self.nrows { "]]" } else { "]\n" })?;
        }
        Ok(())
    }
}
