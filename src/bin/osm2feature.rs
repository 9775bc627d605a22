use clap::{Parser, ValueEnum};
use osm2feature::{threading, Classifier, ClassifTree, DrawingRules, Element, NoMetadata};

#[derive(ValueEnum, Debug, Copy, Clone, Default)]
pub enum Format {
    #[default]
    Json,

    #[cfg(feature = "message-pack")]
    MessagePack,
}
impl Format {
    pub fn write(
        &self,
        mut writer: impl std::io::Write,
        data: &impl serde::Serialize,
    ) -> Result<(), String> {
        match self {
            Format::Json => serde_json::to_writer(writer, data).map_err(|error| error.to_string()),
            #[cfg(feature = "message-pack")]
            Format::MessagePack => {
                rmp_serde::encode::write(&mut writer, data).map_err(|error| error.to_string())
            }
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// JSON file with the elements to classify
    elements: String,

    /// Classification tree definition
    #[clap(short, long, default_value = "data/classificator.txt")]
    classificator: String,

    /// Worker threads, 0 meaning one per core
    #[clap(short, long, default_value_t = 0)]
    jobs: usize,

    /// Data format when writing to stdout
    #[clap(value_enum, short, long, default_value_t = Default::default())]
    format: Format,
}

fn main() -> Result<(), String> {
    env_logger::init();

    let Args {
        elements,
        classificator,
        jobs,
        format,
    } = Args::parse();

    let definition =
        std::fs::read_to_string(&classificator).map_err(|error| error.to_string())?;
    let tree: ClassifTree = definition.parse().map_err(|error: osm2feature::ClassifError| {
        format!("{classificator}: {error}")
    })?;
    let draw = DrawingRules::from_tree(&tree);
    let classifier = Classifier::new(&tree, draw).map_err(|error| error.to_string())?;

    let file = std::fs::File::open(&elements).map_err(|error| error.to_string())?;
    let elements: Vec<Element> =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|error| error.to_string())?;

    log::info!("classifying {} elements", elements.len());
    let params = threading::classify_batch(&classifier, &NoMetadata, elements, jobs);

    format.write(std::io::stdout(), &params)?;

    Ok(())
}
