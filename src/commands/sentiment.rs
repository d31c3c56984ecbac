use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type};

use super::util;
use crate::algo::oracle::ProcessOracle;
use crate::ops;
use crate::SurveyPlugin;

pub struct Sentiment;

impl PluginCommand for Sentiment {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey sentiment"
    }

    fn description(&self) -> &str {
        "Score each comment with an external 1-5 star classifier and add a sentiment label"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::table(), Type::table())
            .required_named(
                "oracle",
                SyntaxShape::String,
                "Classifier program speaking JSON lines on stdin/stdout",
                Some('o'),
            )
            .named(
                "oracle-args",
                SyntaxShape::List(Box::new(SyntaxShape::String)),
                "Arguments passed to the classifier program",
                Some('a'),
            )
            .named(
                "field",
                SyntaxShape::String,
                "Comment column (default: comentarios)",
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
        vec!["sentiment", "stars", "classify", "survey", "score"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "open pesquisa.csv | survey normalize | survey sentiment --oracle ./classify.py",
            description: "Label every comment from muito ruim to muito bom",
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
            config.columns.comment = field;
        }
        let program: String = call
            .get_flag("oracle")?
            .ok_or_else(|| LabeledError::new("--oracle is required").with_label("missing flag", head))?;
        let args: Vec<String> = call.get_flag("oracle-args")?.unwrap_or_default();

        let rows = util::collect_rows(input);
        let ds = util::table_to_dataset(&rows, head)?;
        let mut oracle = ProcessOracle::spawn(&program, &args).map_err(|e| {
            LabeledError::new(format!("cannot start classifier '{program}': {e}"))
                .with_label("oracle", head)
        })?;
        let (ds, failures) =
            ops::op_sentiment(ds, &mut oracle, &config).map_err(|e| util::to_labeled(e, head))?;
        if !failures.is_empty() {
            tracing::warn!(failures = failures.len(), "some comments could not be scored");
        }
        Ok(util::dataset_to_pipeline(&ds, &config, head))
    }
}
