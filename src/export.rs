use crate::record::Bird;
use csv::Writer;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Scientific Name")]
    scientific_name: &'a str,
    #[serde(rename = "Family")]
    family: Option<&'a str>,
    #[serde(rename = "Habitat")]
    habitat: Option<&'a str>,
    #[serde(rename = "Diet")]
    diet: Option<&'a str>,
    #[serde(rename = "Conservation Status")]
    conservation_status: Option<&'a str>,
    #[serde(rename = "Category")]
    category: String,
}

impl<'a> From<&'a Bird> for ExportRow<'a> {
    fn from(bird: &'a Bird) -> Self {
        Self {
            name: &bird.name,
            scientific_name: &bird.scientific_name,
            family: bird.family.as_deref(),
            habitat: bird.habitat.as_deref(),
            diet: bird.diet.as_deref(),
            conservation_status: bird.conservation_status.as_deref(),
            category: bird.category.to_string(),
        }
    }
}

/// Writes one row per bird and returns how many were written.
pub fn export_birds(birds: &[&Bird], path: &Path) -> Result<usize, csv::Error> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);

    for bird in birds {
        writer.serialize(ExportRow::from(*bird))?;
    }

    writer.flush()?;
    info!("Exported {} birds to {}", birds.len(), path.display());
    Ok(birds.len())
}
