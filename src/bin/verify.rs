//! Build-verification executable: exercises dataset creation, optional
//! deflate compression, and file-locking configuration end to end, printing
//! a diagnostic line per failed check and exiting non-zero on any failure.

use gridcask::access::{self, AccessConfig};
use gridcask::{format, write, Error, FileReader};
use ndarray::Array2;

const PLAIN_FILE: &str = "dset.gck";
const COMPRESSED_FILE: &str = "dset_compressed.gck";
const LOCKING_FILE: &str = "test_file_locking.gck";
const INVALID_FILE: &str = "dset_invalid.gck";

fn reference_data() -> Array2<i32> {
    Array2::from_shape_fn((4, 6), |(i, j)| (i * 6 + j) as i32)
}

fn read_back(path: &str, name: &str) -> anyhow::Result<Array2<i32>> {
    let mut file = FileReader::open(path)?;
    let dataset = file.dataset(name)?;
    Ok(dataset.read::<i32>(&mut file)?)
}

fn check_plain_dataset() -> anyhow::Result<()> {
    let data = reference_data();
    write::create_and_write(PLAIN_FILE, "dset", data.view(), None, None)?;
    let read = read_back(PLAIN_FILE, "dset")?;
    anyhow::ensure!(
        read == data,
        "plain dataset did not round-trip: got {:?}",
        read
    );
    Ok(())
}

fn check_compressed_dataset() -> anyhow::Result<()> {
    anyhow::ensure!(format::deflate_available(), "gzip filter not available!");
    println!("gzip filter is available");

    let data = reference_data();
    write::create_and_write(
        COMPRESSED_FILE,
        "compressed_dset",
        data.view(),
        Some([2, 3]),
        Some(6),
    )?;
    println!("Successfully wrote compressed dataset with gzip");

    let read = read_back(COMPRESSED_FILE, "compressed_dset")?;
    anyhow::ensure!(
        read == data,
        "compressed dataset did not round-trip: got {:?}",
        read
    );
    Ok(())
}

fn check_compression_precondition() -> anyhow::Result<()> {
    let data = reference_data();
    let result = write::create_and_write(INVALID_FILE, "dset", data.view(), None, Some(6));
    anyhow::ensure!(
        matches!(&result, Err(Error::InvalidChunkShape(_))),
        "compression without chunking was not rejected: {:?}",
        result.err().map(|err| err.to_string())
    );
    anyhow::ensure!(
        !std::path::Path::new(INVALID_FILE).exists(),
        "rejected write still created `{INVALID_FILE}`"
    );
    Ok(())
}

fn check_file_locking() -> anyhow::Result<()> {
    let config = AccessConfig::new(true, false);
    let (use_file_locking, ignore_when_disabled) = config.effective_policy();
    anyhow::ensure!(
        (use_file_locking, ignore_when_disabled) == (true, false),
        "File locking settings read back as ({use_file_locking}, {ignore_when_disabled})"
    );
    println!(
        "File locking correctly enabled (use_file_locking={}, ignore_when_disabled={})",
        use_file_locking, ignore_when_disabled
    );

    let config = AccessConfig::new(false, true);
    anyhow::ensure!(
        config.effective_policy() == (false, true),
        "Disabled locking policy did not read back as (false, true)"
    );

    let config = AccessConfig::new(access::locking_supported(), true);
    let container = access::open_with_policy(LOCKING_FILE, &config)?;
    println!("Successfully created file with file locking settings");
    container.close()?;
    Ok(())
}

fn check_overwrite_and_reopen() -> anyhow::Result<()> {
    let stale = Array2::from_elem((2, 2), -1i32);
    write::create_and_write(PLAIN_FILE, "stale", stale.view(), None, None)?;

    let data = reference_data();
    write::create_and_write(PLAIN_FILE, "dset", data.view(), None, None)?;
    let file = FileReader::open(PLAIN_FILE)?;
    anyhow::ensure!(
        file.dataset_names() == vec!["dset"],
        "overwritten container still lists {:?}",
        file.dataset_names()
    );
    drop(file);

    // The container survives being closed and reopened unchanged.
    let read = read_back(PLAIN_FILE, "dset")?;
    anyhow::ensure!(
        read == data,
        "reopened dataset did not round-trip: got {:?}",
        read
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let checks: &[(&str, fn() -> anyhow::Result<()>)] = &[
        ("plain dataset", check_plain_dataset),
        ("zlib compression", check_compressed_dataset),
        ("compression precondition", check_compression_precondition),
        ("file locking configuration", check_file_locking),
        ("overwrite and reopen", check_overwrite_and_reopen),
    ];

    let mut failures = 0;
    for (name, check) in checks {
        println!("Testing {name}");
        if let Err(err) = check() {
            println!("ERROR: {name}: {err:#}");
            failures += 1;
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
}
