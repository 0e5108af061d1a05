use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    filename: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let Args { filename } = Args::parse();
    let mut file = gridcask::FileReader::open(&filename)
        .with_context(|| format!("Could not open `{filename}`"))?;
    println!(
        "{} datasets, {} bytes",
        file.superblock.dataset_count, file.superblock.end_of_file_address
    );
    for name in file.dataset_names() {
        let dataset = file.dataset(&name)?;
        println!("{name:?}");
        println!("{:#?}", dataset.header);
        let datatype = dataset.datatype();
        if datatype.size == 4 && datatype.signed() {
            let values = dataset.read::<i32>(&mut file)?;
            println!("{values:#?}");
        }
    }
    return Ok(());
}
