use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type};

use super::util;
use crate::ops;
use crate::SurveyPlugin;

pub struct Normalize;

impl PluginCommand for Normalize {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey normalize"
    }

    fn description(&self) -> &str {
        "Clean column names, lowercase text cells and coerce call durations"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::table(), Type::table())
            .named(
                "config",
                SyntaxShape::Filepath,
                "JSON configuration file (default: $SURVEY_CONFIG or XDG config)",
                Some('c'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["normalize", "clean", "survey", "columns"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "open pesquisa.csv | survey normalize",
            description: "Normalize a raw survey export",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &SurveyPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let head = call.head;
        let config = util::survey_config(call)?;
        let rows = util::collect_rows(input);
        let raw = util::table_to_dataset(&rows, head)?;
        let ds = ops::op_normalize(raw, &config).map_err(|e| util::to_labeled(e, head))?;
        Ok(util::dataset_to_pipeline(&ds, &config, head))
    }
}
