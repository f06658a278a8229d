use std::path::Path;

use crate::error::Result;
use crate::scenario::TestData;

use super::{ScenarioModifiers, ScenarioParser, into_test_data, load_scenario};

/// Parser for plain JSON scenario files. Template variables are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ScenarioParser for JsonParser {
    fn parse(
        &self,
        scenarios_dir: &Path,
        scenario_file: &str,
        test_name: &str,
        modifiers: &ScenarioModifiers,
    ) -> Result<TestData> {
        let loaded = load_scenario(scenarios_dir, scenario_file, test_name)?;
        into_test_data(loaded, modifiers)
    }
}
