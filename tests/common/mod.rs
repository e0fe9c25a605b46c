// Common test fixtures for the terrain pipeline tests
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a CSV fixture into the test directory and return its path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).expect("Failed to create fixture");
    f.write_all(contents.as_bytes())
        .expect("Failed to write fixture");
    path
}

/// 3x3 unit-spacing heightmap with a raised center node. The origin row
/// (the first matrix row in the file) sits at y = 2.
pub const BUMP_HEIGHTMAP: &str = "\
Number of Rows | Number of Columns | Grid spacing rows | Grid spacing columns | Coordinates of the first point in the matrix (x,y)
3 3 1.0 1.0 0.0 2.0
0,0,0
0,1,0
0,0,0
";

/// Two landmarks with placeholder heights and an extra trailing column.
pub const LANDMARKS: &str = "\
name,x,y,z,marker_id
post_1,0.5,0.5,9.9,17
post_2,1.0,1.0,9.9,18
";
