use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use eyre::Result;

/// Write contents to a file on the disc, creating parent directories as needed
///
/// ```no_run
/// use slotscope_common::utils::io::file::write_file;
///
/// let path = "/tmp/test.txt";
/// let contents = "Hello, World!";
/// let result = write_file(path, contents);
/// ```
pub fn write_file(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();

    // Create the directory if it doesn't exist
    std::fs::create_dir_all(
        path.parent().ok_or_else(|| eyre::eyre!("unable to create directory"))?,
    )?;

    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;

    Ok(())
}

/// Read contents from a file on the disc
///
/// ```no_run
/// use slotscope_common::utils::io::file::read_file;
///
/// let path = "/tmp/test.txt";
/// let contents = read_file(path);
/// ```
pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Delete a file from the disc. Missing files are not an error.
///
/// ```no_run
/// use slotscope_common::utils::io::file::delete_path;
///
/// let path = "/tmp/test.txt";
/// let result = delete_path(path);
/// ```
pub fn delete_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
