use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type};

use super::util;
use crate::ops;
use crate::SurveyPlugin;

pub struct Region;

impl PluginCommand for Region {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey region"
    }

    fn description(&self) -> &str {
        "Derive a region column from the location field (second '/' segment, upper-cased)"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::table(), Type::table())
            .named(
                "field",
                SyntaxShape::String,
                "Location column (default: localizacao)",
                Some('f'),
            )
            .named(
                "config",
                SyntaxShape::Filepath,
                "JSON configuration file",
                Some('c'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["region", "state", "location", "survey"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: r#"[[localizacao]; ["sao paulo/sp/sao paulo"] ["rio de janeiro/rj"]] | survey region"#,
            description: "Add a region column holding SP and RJ",
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
        let mut config = util::survey_config(call)?;
        if let Some(field) = call.get_flag::<String>("field")? {
            config.columns.location = field;
        }
        let rows = util::collect_rows(input);
        let ds = util::table_to_dataset(&rows, head)?;
        let ds = ops::op_region(ds, &config).map_err(|e| util::to_labeled(e, head))?;
        Ok(util::dataset_to_pipeline(&ds, &config, head))
    }
}
