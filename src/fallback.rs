use crate::record::{Category, NewBird};

#[allow(clippy::too_many_arguments)]
fn bird(
    name: &str,
    scientific_name: &str,
    family: &str,
    habitat: &str,
    diet: &str,
    conservation_status: &str,
    description: &str,
    wikipedia_url: &str,
    image_url: &str,
    category: Category,
) -> NewBird {
    NewBird {
        family: Some(family.to_string()),
        habitat: Some(habitat.to_string()),
        diet: Some(diet.to_string()),
        conservation_status: Some(conservation_status.to_string()),
        description: Some(description.to_string()),
        wikipedia_url: Some(wikipedia_url.to_string()),
        image_url: Some(image_url.to_string()),
        ..NewBird::new(name, scientific_name).with_category(category)
    }
}

/// Built-in catalog used whenever the seed source cannot be read.
pub fn fallback_birds() -> Vec<NewBird> {
    vec![
        bird(
            "Golden Eagle",
            "Aquila chrysaetos",
            "Accipitridae",
            "Mountains, open country, semi-desert",
            "Small mammals, birds, reptiles",
            "Least Concern",
            "The Golden Eagle is one of the best-known birds of prey in the Northern Hemisphere. \
             It is the most widely distributed species of eagle.",
            "https://en.wikipedia.org/wiki/Golden_eagle",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/9/91/Golden_Eagle_in_flight_-_5.jpg/800px-Golden_Eagle_in_flight_-_5.jpg",
            Category::Common,
        ),
        bird(
            "Blue Jay",
            "Cyanocitta cristata",
            "Corvidae",
            "Forests, suburban areas, parks",
            "Nuts, seeds, insects, small vertebrates",
            "Least Concern",
            "The Blue Jay is a passerine bird in the corvid family, native to eastern North America. \
             Blue Jays are known for their intelligence, complex social systems, and noisy calls.",
            "https://en.wikipedia.org/wiki/Blue_jay",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/f/f4/Blue_jay_in_PP_%2830960%29.jpg/800px-Blue_jay_in_PP_%2830960%29.jpg",
            Category::Common,
        ),
        bird(
            "Peregrine Falcon",
            "Falco peregrinus",
            "Falconidae",
            "Various, from tundra to deserts",
            "Birds",
            "Least Concern",
            "The Peregrine Falcon is a widespread bird of prey in the family Falconidae. \
             It is famous for its speed, reaching over 320 km/h during its hunting stoop.",
            "https://en.wikipedia.org/wiki/Peregrine_falcon",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/2/29/Falco_peregrinus_good_-_Christopher_Watson.jpg/800px-Falco_peregrinus_good_-_Christopher_Watson.jpg",
            Category::Rare,
        ),
        bird(
            "California Condor",
            "Gymnogyps californianus",
            "Cathartidae",
            "Remote, steep, forested mountains",
            "Carrion",
            "Critically Endangered",
            "The California Condor is a New World vulture, the largest North American land bird. \
             It became extinct in the wild in 1987 and has since been reintroduced.",
            "https://en.wikipedia.org/wiki/California_condor",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/d/d5/Gymnogyps_californianus_-San_Diego_Zoo-8a.jpg/800px-Gymnogyps_californianus_-San_Diego_Zoo-8a.jpg",
            Category::Endangered,
        ),
        bird(
            "Atlantic Puffin",
            "Fratercula arctica",
            "Alcidae",
            "Rocky islands, North Atlantic",
            "Fish",
            "Vulnerable",
            "The Atlantic Puffin is a species of seabird in the auk family. \
             It is the only puffin native to the Atlantic Ocean.",
            "https://en.wikipedia.org/wiki/Atlantic_puffin",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/c/c4/Puffin_%28Fratercula_arctica%29.jpg/800px-Puffin_%28Fratercula_arctica%29.jpg",
            Category::Rare,
        ),
    ]
}
