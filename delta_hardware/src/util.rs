use std::{fs, io::Write, path::Path};

/// Write `bytes` to a sibling temp file and rename it over `path`, so a
/// reader polling `path` never sees a partial frame.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
