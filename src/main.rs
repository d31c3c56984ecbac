use nu_plugin::{serve_plugin, MsgPackSerializer};
use nu_plugin_survey::SurveyPlugin;

fn main() {
    serve_plugin(&SurveyPlugin, MsgPackSerializer {})
}
