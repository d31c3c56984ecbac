use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type};

use super::util;
use crate::ops;
use crate::SurveyPlugin;

pub struct Cluster;

impl PluginCommand for Cluster {
    type Plugin = SurveyPlugin;

    fn name(&self) -> &str {
        "survey cluster"
    }

    fn description(&self) -> &str {
        "Group negative comments per service type with TF-IDF and k-means"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::table(), Type::table())
            .named(
                "clusters",
                SyntaxShape::Int,
                "Clusters per service type (default: 3)",
                Some('k'),
            )
            .named(
                "max-vocab",
                SyntaxShape::Int,
                "Max vocabulary size per group (default: 500)",
                None,
            )
            .named("seed", SyntaxShape::Int, "Random seed (default: 7)", None)
            .named(
                "config",
                SyntaxShape::Filepath,
                "JSON configuration file",
                Some('c'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["cluster", "kmeans", "complaints", "negative", "survey"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "open pesquisa.csv | survey normalize | survey sentiment --oracle ./classify.py | survey cluster --clusters 4",
            description: "Cluster negative comments into four groups per service",
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
        if let Some(k) = call.get_flag::<i64>("clusters")? {
            config.clustering.n_clusters = k.max(0) as usize;
        }
        if let Some(v) = call.get_flag::<i64>("max-vocab")? {
            config.clustering.max_vocab = v.max(0) as usize;
        }
        if let Some(seed) = call.get_flag::<i64>("seed")? {
            config.clustering.seed = seed as u64;
        }

        let rows = util::collect_rows(input);
        let ds = util::table_to_dataset(&rows, head)?;
        let (clustered, _) = ops::op_cluster(&ds, &config).map_err(|e| util::to_labeled(e, head))?;
        Ok(util::dataset_to_pipeline(&clustered, &config, head))
    }
}
