use minijinja::{context, Environment};

use crate::dart::color_literal;
use crate::error::GenerateError;
use crate::model::Snapshot;

/// Render `lib/theme/app_theme.dart` from the application's shared Theme.
pub fn emit(snap: &Snapshot, env: &Environment<'_>) -> Result<String, GenerateError> {
    let t = &snap.theme;
    let tmpl = env.get_template("app_theme.dart")?;
    let out = tmpl.render(context! {
        primary => color_literal(&t.primary_color),
        accent => color_literal(&t.accent_color),
        background => color_literal(&t.background_color),
        text => color_literal(&t.text_color),
        font_family => crate::dart::escape_string(&t.font_family),
    })?;
    Ok(out)
}
