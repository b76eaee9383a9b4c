use serde::Serialize;

use super::request::PredictionResults;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelImage {
    pub model: String,
    pub url: String,
}

/// Every model's rendering of one image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonGroup {
    pub image_key: String,
    pub entries: Vec<ModelImage>,
}

impl ComparisonGroup {
    /// Grid width used to lay the entries out side by side.
    pub fn columns(&self) -> usize {
        if self.entries.len() > 2 { 3 } else { 2 }
    }
}

/// Group output images by file name across `models`, in first-seen order.
pub fn group_for_comparison(models: &[String], results: &PredictionResults) -> Vec<ComparisonGroup> {
    let mut groups: Vec<ComparisonGroup> = Vec::new();
    for model in models {
        for url in results.images_for(model) {
            let key = image_key(url);
            let entry = ModelImage {
                model: model.clone(),
                url: url.clone(),
            };
            match groups.iter_mut().find(|group| group.image_key == key) {
                Some(group) => group.entries.push(entry),
                None => groups.push(ComparisonGroup {
                    image_key: key.to_string(),
                    entries: vec![entry],
                }),
            }
        }
    }
    groups
}

fn image_key(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::request::ModelImages;

    fn results(entries: &[(&str, &[&str])]) -> PredictionResults {
        let mut results = PredictionResults::default();
        for (model, images) in entries {
            results.results_summary.insert(
                model.to_string(),
                ModelImages {
                    images: images.iter().map(|url| url.to_string()).collect(),
                },
            );
        }
        results
    }

    #[test]
    fn groups_by_file_name_in_first_seen_order() {
        let results = results(&[
            ("m1", &["/p/m1/confusion.png", "/p/m1/f1.png"]),
            ("m2", &["/p/m2/f1.png", "/p/m2/confusion.png", "/p/m2/extra.png"]),
        ]);
        let models = vec!["m1".to_string(), "m2".to_string()];
        let groups = group_for_comparison(&models, &results);
        let keys: Vec<_> = groups.iter().map(|g| g.image_key.as_str()).collect();
        assert_eq!(keys, vec!["confusion.png", "f1.png", "extra.png"]);
        assert_eq!(groups[0].entries[1].model, "m2");
        assert_eq!(groups[0].entries[1].url, "/p/m2/confusion.png");
        assert_eq!(groups[0].columns(), 2);
    }

    #[test]
    fn three_models_use_three_columns() {
        let results = results(&[
            ("a", &["x/r.png"]),
            ("b", &["y/r.png"]),
            ("c", &["z/r.png"]),
        ]);
        let models: Vec<String> = ["a", "b", "c"].iter().map(|m| m.to_string()).collect();
        let groups = group_for_comparison(&models, &results);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].columns(), 3);
    }

    #[test]
    fn models_missing_from_results_contribute_nothing() {
        let results = results(&[("a", &["r.png"])]);
        let models = vec!["ghost".to_string(), "a".to_string()];
        let groups = group_for_comparison(&models, &results);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].image_key, "r.png");
    }
}
