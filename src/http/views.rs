//! HTML views rendered with minijinja.
//!
//! Templates are compiled into the binary and parsed once at startup.

use minijinja::{context, Environment, UndefinedBehavior};

use crate::domain::{PredictionResult, FEATURE_NAMES};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const VISUALIZATION_TEMPLATE: &str = include_str!("../../templates/visualization.html");

pub const INDEX: &str = "index.html";
pub const VISUALIZATION: &str = "visualization.html";

/// Parsed page templates.
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
    debug: bool,
}

impl Views {
    /// Load the bundled templates.
    ///
    /// # Errors
    /// Returns an error if a template fails to parse.
    pub fn new(debug: bool) -> Result<Self, minijinja::Error> {
        Self::from_sources(INDEX_TEMPLATE, VISUALIZATION_TEMPLATE, debug)
    }

    /// Load views from explicit template sources.
    ///
    /// # Errors
    /// Returns an error if a template fails to parse.
    pub fn from_sources(
        index: &'static str,
        visualization: &'static str,
        debug: bool,
    ) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template(INDEX, index)?;
        env.add_template(VISUALIZATION, visualization)?;
        Ok(Self { env, debug })
    }

    /// Home page with the questionnaire form.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn index(&self) -> Result<String, minijinja::Error> {
        self.env
            .get_template(INDEX)?
            .render(context! { debug => self.debug, fields => FEATURE_NAMES })
    }

    /// Risk visualization, with or without an assessment to show.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn visualization(
        &self,
        prediction: Option<&PredictionResult>,
    ) -> Result<String, minijinja::Error> {
        self.env
            .get_template(VISUALIZATION)?
            .render(context! { debug => self.debug, prediction => prediction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, Prediction, RiskPolicy};

    #[test]
    fn test_index_renders_every_field() {
        let html = Views::new(false).expect("templates").index().expect("render");
        for field in FEATURE_NAMES {
            assert!(html.contains(&format!("name=\"{field}\"")), "missing {field}");
        }
        assert!(html.contains("action=\"/predict\""));
    }

    #[test]
    fn test_visualization_without_prediction() {
        let html = Views::new(false)
            .expect("templates")
            .visualization(None)
            .expect("render");
        assert!(html.contains("No assessment yet"));
    }

    #[test]
    fn test_visualization_embeds_prediction() {
        let result = RiskPolicy::default()
            .classify(Prediction::Probability(0.2), FeatureVector::default());
        let html = Views::new(false)
            .expect("templates")
            .visualization(Some(&result))
            .expect("render");
        assert!(html.contains("High Risk"));
        assert!(html.contains("20.0"));
        assert!(html.contains("Immediate colonoscopy"));
    }

    #[test]
    fn test_undefined_variables_fail_rendering() {
        let views = Views::from_sources("{{ missing.value }}", "ok", false).expect("parse");
        assert!(views.index().is_err());
    }
}
