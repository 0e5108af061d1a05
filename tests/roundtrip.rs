use gridcask::access::{self, AccessConfig};
use gridcask::{write, Error, FileReader};
use ndarray::{array, Array2};
use std::path::PathBuf;

fn reference_grid() -> Array2<i32> {
    Array2::from_shape_fn((4, 6), |(i, j)| (i * 6 + j) as i32)
}

fn scratch_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn read_i32(path: &PathBuf, name: &str) -> Result<Array2<i32>, Error> {
    let mut file = FileReader::open(path)?;
    let dataset = file.dataset(name)?;
    dataset.read::<i32>(&mut file)
}

#[test]
fn plain_roundtrip() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "dset.gck");
    let data = reference_grid();
    write::create_and_write(&path, "dset", data.view(), None, None)?;
    assert_eq!(read_i32(&path, "dset")?, data);
    Ok(())
}

#[test]
fn plain_roundtrip_single_element() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "one.gck");
    let data = array![[42i32]];
    write::create_and_write(&path, "one", data.view(), None, None)?;
    assert_eq!(read_i32(&path, "one")?, data);
    Ok(())
}

#[test]
fn chunked_roundtrip_without_compression() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "chunked.gck");
    let data = reference_grid();
    write::create_and_write(&path, "chunked", data.view(), Some([2, 3]), None)?;
    assert_eq!(read_i32(&path, "chunked")?, data);
    Ok(())
}

#[cfg(feature = "deflate")]
#[test]
fn compressed_roundtrip_matches_uncompressed_content() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let data = reference_grid();

    let plain = scratch_path(&dir, "plain.gck");
    write::create_and_write(&plain, "dset", data.view(), None, None)?;

    for level in [1, 6, 9] {
        let compressed = scratch_path(&dir, &format!("compressed_{level}.gck"));
        write::create_and_write(&compressed, "dset", data.view(), Some([2, 3]), Some(level))?;
        assert_eq!(read_i32(&compressed, "dset")?, read_i32(&plain, "dset")?);
    }
    Ok(())
}

#[cfg(feature = "deflate")]
#[test]
fn compressed_roundtrip_with_non_dividing_chunks() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "edges.gck");
    let data = Array2::from_shape_fn((5, 7), |(i, j)| (i as i32 + 1) * 1000 - j as i32);
    write::create_and_write(&path, "edges", data.view(), Some([3, 4]), Some(4))?;
    assert_eq!(read_i32(&path, "edges")?, data);
    Ok(())
}

#[test]
fn i64_roundtrip() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "wide.gck");
    let data = array![[i64::MIN, -1, 0], [1, 1 << 40, i64::MAX]];
    write::create_and_write(&path, "wide", data.view(), Some([2, 2]), None)?;
    let mut file = FileReader::open(&path)?;
    let dataset = file.dataset("wide")?;
    assert_eq!(dataset.read::<i64>(&mut file)?, data);
    Ok(())
}

#[test]
fn compression_without_chunking_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_path(&dir, "never_written.gck");
    let data = reference_grid();
    let result = write::create_and_write(&path, "dset", data.view(), None, Some(6));
    assert!(matches!(result, Err(Error::InvalidChunkShape(_))));
    assert!(!path.exists());
}

#[test]
fn oversized_chunk_shape_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_path(&dir, "never_written.gck");
    let data = reference_grid();
    let result = write::create_and_write(&path, "dset", data.view(), Some([5, 3]), None);
    assert!(matches!(result, Err(Error::InvalidChunkShape(_))));
    assert!(!path.exists());
}

#[test]
fn overwrite_replaces_previous_content() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "overwritten.gck");
    let stale = Array2::from_elem((3, 3), 7i32);
    write::create_and_write(&path, "stale", stale.view(), None, None)?;

    let fresh = reference_grid();
    write::create_and_write(&path, "dset", fresh.view(), Some([2, 3]), None)?;

    let file = FileReader::open(&path)?;
    assert_eq!(file.dataset_names(), vec!["dset"]);
    assert!(matches!(file.dataset("stale"), Err(Error::NotFound(_))));
    drop(file);
    assert_eq!(read_i32(&path, "dset")?, fresh);
    Ok(())
}

#[test]
fn missing_container_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_path(&dir, "absent.gck");
    assert!(matches!(FileReader::open(&path), Err(Error::NotFound(_))));
}

#[test]
fn missing_dataset_is_not_found() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "dset.gck");
    write::create_and_write(&path, "dset", reference_grid().view(), None, None)?;
    let file = FileReader::open(&path)?;
    assert!(matches!(file.dataset("other"), Err(Error::NotFound(_))));
    Ok(())
}

#[test]
fn locking_policy_reads_back() {
    assert_eq!(
        AccessConfig::new(true, false).effective_policy(),
        (true, false)
    );
    assert_eq!(
        AccessConfig::new(false, true).effective_policy(),
        (false, true)
    );
}

#[test]
fn closed_container_leaves_data_intact() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "locked.gck");
    let data = reference_grid();
    write::create_and_write(&path, "dset", data.view(), Some([2, 3]), None)?;

    // Open and close the container under an exclusive lock, then confirm
    // the content is still readable and unchanged.
    let config = AccessConfig::new(access::locking_supported(), true);
    let container = access::open_with_policy(&path, &config)?;
    container.close()?;

    assert_eq!(read_i32(&path, "dset")?, data);
    assert_eq!(read_i32(&path, "dset")?, data);
    Ok(())
}

#[test]
fn open_with_policy_creates_missing_container_file() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = scratch_path(&dir, "fresh.gck");
    let container = access::open_with_policy(&path, &AccessConfig::new(false, true))?;
    assert!(path.exists());
    assert!(!container.is_locked());
    container.close()?;
    Ok(())
}
