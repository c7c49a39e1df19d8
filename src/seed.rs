//! Tabular seed source for the catalog.
//!
//! The catalog spreadsheet went through several revisions with Portuguese and
//! English headers, so each field is looked up under every spelling it has
//! been seen with. Within a row the first non-empty cell among those
//! headers wins.

use crate::image_url::normalize_image_url;
use crate::record::{Category, NewBird};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const NAME: &[&str] = &["Nome", "Nome Comum", "name"];
const SCIENTIFIC_NAME: &[&str] = &["Nome Científico", "Scientific Name", "scientificName"];
const FAMILY: &[&str] = &["Família", "Family", "family"];
const HABITAT: &[&str] = &["Habitat", "habitat"];
const DIET: &[&str] = &["Alimentação", "Diet", "diet"];
const CONSERVATION_STATUS: &[&str] =
    &["Nível ameaça", "Conservation Status", "conservationStatus"];
const DESCRIPTION: &[&str] = &["Características", "Description", "description"];
const WIKIPEDIA_URL: &[&str] = &["Wikipedia", "wikipediaUrl"];
const IMAGE_URL: &[&str] = &["Imagem", "Picture", "Image URL", "imageUrl"];
const CATEGORY: &[&str] = &["Categoria", "Category", "category"];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("could not open seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed seed data: {0}")]
    Csv(#[from] csv::Error),

    #[error("seed data has no usable rows")]
    Empty,
}

/// Column positions resolved from the header row, in candidate order.
struct Columns {
    name: Vec<usize>,
    scientific_name: Vec<usize>,
    family: Vec<usize>,
    habitat: Vec<usize>,
    diet: Vec<usize>,
    conservation_status: Vec<usize>,
    description: Vec<usize>,
    wikipedia_url: Vec<usize>,
    image_url: Vec<usize>,
    category: Vec<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Self {
        let find = |candidates: &[&str]| -> Vec<usize> {
            candidates
                .iter()
                .filter_map(|candidate| headers.iter().position(|h| h == *candidate))
                .collect()
        };

        Self {
            name: find(NAME),
            scientific_name: find(SCIENTIFIC_NAME),
            family: find(FAMILY),
            habitat: find(HABITAT),
            diet: find(DIET),
            conservation_status: find(CONSERVATION_STATUS),
            description: find(DESCRIPTION),
            wikipedia_url: find(WIKIPEDIA_URL),
            image_url: find(IMAGE_URL),
            category: find(CATEGORY),
        }
    }
}

fn cell(row: &StringRecord, columns: &[usize]) -> Option<String> {
    columns
        .iter()
        .filter_map(|&index| row.get(index))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn read_birds(path: &Path) -> Result<Vec<NewBird>, SeedError> {
    let file = File::open(path)?;
    info!("Reading seed birds from {}", path.display());
    read_birds_from(file)
}

pub fn read_birds_from<R: Read>(reader: R) -> Result<Vec<NewBird>, SeedError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::resolve(reader.headers()?);
    let mut birds = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let (Some(name), Some(scientific_name)) = (
            cell(&row, &columns.name),
            cell(&row, &columns.scientific_name),
        ) else {
            warn!(
                "Row {} is missing a name or scientific name, skipping",
                index + 1
            );
            continue;
        };

        birds.push(NewBird {
            name,
            scientific_name,
            family: cell(&row, &columns.family),
            habitat: cell(&row, &columns.habitat),
            diet: cell(&row, &columns.diet),
            conservation_status: cell(&row, &columns.conservation_status),
            description: cell(&row, &columns.description),
            wikipedia_url: cell(&row, &columns.wikipedia_url),
            image_url: cell(&row, &columns.image_url)
                .map(|url| normalize_image_url(&url))
                .filter(|url| !url.is_empty()),
            category: cell(&row, &columns.category).map(|label| Category::from_label(&label)),
        });
    }

    if birds.is_empty() {
        return Err(SeedError::Empty);
    }

    info!("Processed {} birds from seed data", birds.len());
    Ok(birds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_portuguese_headers() {
        let data = "Nome Comum,Nome Científico,Família,Alimentação,Categoria,Picture\n\
                    Sabiá-laranjeira,Turdus rufiventris,Turdidae,Frutos,comum,//upload.wikimedia.org/a/b/Turdus.jpg\n\
                    Arara-azul,Anodorhynchus hyacinthinus,,Sementes,Ameaçada,\n";

        let birds = read_birds_from(data.as_bytes()).unwrap();

        assert_eq!(birds.len(), 2);
        assert_eq!(birds[0].name, "Sabiá-laranjeira");
        assert_eq!(birds[0].family.as_deref(), Some("Turdidae"));
        assert_eq!(birds[0].diet.as_deref(), Some("Frutos"));
        assert_eq!(
            birds[0].image_url.as_deref(),
            Some(
                "https://commons.wikimedia.org/w/index.php?title=Special:Redirect/file/Turdus.jpg&width=500"
            )
        );
        assert_eq!(birds[1].family, None);
        assert_eq!(birds[1].image_url, None);
        assert_eq!(birds[1].category, Some(Category::Endangered));
    }

    #[test]
    fn test_first_matching_header_wins() {
        let data = "name,Nome,scientificName\nignored,Bem-te-vi,Pitangus sulphuratus\n";

        let birds = read_birds_from(data.as_bytes()).unwrap();

        assert_eq!(birds[0].name, "Bem-te-vi");
        assert_eq!(birds[0].category, None);
    }

    #[test]
    fn test_blank_cell_falls_back_to_next_header() {
        let data = "Nome,Nome Comum,Nome Científico,Família,Family\n\
                    ,Bem-te-vi,Pitangus sulphuratus,,Tyrannidae\n\
                    Sanhaço,,Thraupis sayaca,Thraupidae,\n";

        let birds = read_birds_from(data.as_bytes()).unwrap();

        assert_eq!(birds.len(), 2);
        assert_eq!(birds[0].name, "Bem-te-vi");
        assert_eq!(birds[0].family.as_deref(), Some("Tyrannidae"));
        assert_eq!(birds[1].name, "Sanhaço");
        assert_eq!(birds[1].family.as_deref(), Some("Thraupidae"));
    }

    #[test]
    fn test_rows_without_names_are_skipped() {
        let data = "Name,Scientific Name\n,Turdus\nRobin,\nTui,Prosthemadera novaeseelandiae\n";
        // "Name" is not a known spelling, so no row has a name.
        assert!(matches!(
            read_birds_from(data.as_bytes()),
            Err(SeedError::Empty)
        ));

        let data = "name,Scientific Name\n,Turdus\nRobin,\nTui,Prosthemadera novaeseelandiae\n";
        let birds = read_birds_from(data.as_bytes()).unwrap();
        assert_eq!(birds.len(), 1);
        assert_eq!(birds[0].name, "Tui");
    }

    #[test]
    fn test_read_birds_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,scientificName,category").unwrap();
        writeln!(file, "Kea,Nestor notabilis,endangered").unwrap();

        let birds = read_birds(file.path()).unwrap();
        assert_eq!(birds.len(), 1);
        assert_eq!(birds[0].category, Some(Category::Endangered));
    }

    #[test]
    fn test_missing_file() {
        let result = read_birds(Path::new("/nonexistent/aviary/birds.csv"));
        assert!(matches!(result, Err(SeedError::Io(_))));
    }
}
