use crate::dart::{color_literal, escape_string, to_camel_case, to_pascal_case};
use crate::error::GenerateError;
use crate::model::Snapshot;
use crate::resolve::{ResolvedProps, ResolvedValue, Resolver};
use crate::tree::WidgetForest;

use super::actions;

/// What a data-bound expression reads from: the screen-level payload or the
/// current row of a list builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    ScreenData,
    ListItem,
}

impl Binding {
    fn access(&self, field_name: &str) -> String {
        let field = escape_string(field_name);
        match self {
            Binding::ScreenData => format!("(_data?['{field}'] ?? '').toString()"),
            Binding::ListItem => format!("(item['{field}'] ?? '').toString()"),
        }
    }
}

/// Emit the constructor expression for one widget node, children included.
///
/// The first line carries no leading indentation (it continues whatever line
/// the caller is building); every following line is padded relative to
/// `indent`. No trailing comma or newline.
pub fn widget_code(
    snap: &Snapshot,
    forest: &WidgetForest,
    idx: usize,
    indent: usize,
    binding: Binding,
) -> Result<String, GenerateError> {
    let node = forest.node(idx);
    let props = Resolver::new(snap).resolve(node.widget)?;

    match node.widget.kind.as_str() {
        "Text" => {
            let expr = display_expr(&props, &["text", "value"], binding)
                .unwrap_or_else(|| "'Text'".to_string());
            let mut style = Vec::new();
            if let Some(c) = color_of(&props, "color") {
                style.push(format!("color: {c}"));
            }
            if let Some(n) = num_of(&props, &["fontSize", "font_size"]) {
                style.push(format!("fontSize: {n}"));
            }
            if let Some(wgt) = str_of(&props, &["fontWeight", "font_weight"]) {
                style.push(format!("fontWeight: FontWeight.{}", to_camel_case(wgt)));
            }
            if style.is_empty() {
                Ok(format!("Text({expr})"))
            } else {
                Ok(format!("Text({expr}, style: TextStyle({}))", style.join(", ")))
            }
        }

        kind @ ("ElevatedButton" | "TextButton" | "OutlinedButton") => {
            let label = display_expr(&props, &["text", "label"], binding)
                .unwrap_or_else(|| "'Button'".to_string());
            let on_pressed = callback_of(snap, &props, &["onPressed", "action"])?
                .unwrap_or_else(|| "null".to_string());
            let mut c = Ctor::new(kind, indent);
            c.arg(format!("onPressed: {on_pressed}"));
            c.arg(format!("child: Text({label})"));
            Ok(c.build())
        }

        "IconButton" => {
            let icon = icon_expr(&props);
            let on_pressed = callback_of(snap, &props, &["onPressed", "action"])?
                .unwrap_or_else(|| "null".to_string());
            let mut c = Ctor::new("IconButton", indent);
            c.arg(format!("icon: {icon}"));
            c.arg(format!("onPressed: {on_pressed}"));
            Ok(c.build())
        }

        "FloatingActionButton" => {
            let on_pressed = callback_of(snap, &props, &["onPressed", "action"])?
                .unwrap_or_else(|| "null".to_string());
            let mut c = Ctor::new("FloatingActionButton", indent);
            c.arg(format!("onPressed: {on_pressed}"));
            c.arg(format!("child: {}", icon_expr(&props)));
            Ok(c.build())
        }

        "Icon" => {
            let mut parts = vec![icon_name(&props)];
            if let Some(n) = num_of(&props, &["size"]) {
                parts.push(format!("size: {n}"));
            }
            if let Some(c) = color_of(&props, "color") {
                parts.push(format!("color: {c}"));
            }
            Ok(format!("Icon({})", parts.join(", ")))
        }

        "Image" => {
            let url = str_of(&props, &["url", "src", "source"]).unwrap_or("");
            let mut c = Ctor::new("Image.network", indent);
            c.arg(format!("'{}'", escape_string(url)));
            if let Some(n) = num_of(&props, &["width"]) {
                c.arg(format!("width: {n}"));
            }
            if let Some(n) = num_of(&props, &["height"]) {
                c.arg(format!("height: {n}"));
            }
            c.arg("fit: BoxFit.cover".to_string());
            Ok(c.build())
        }

        "Divider" => {
            let mut parts = Vec::new();
            if let Some(n) = num_of(&props, &["thickness"]) {
                parts.push(format!("thickness: {n}"));
            }
            if let Some(c) = color_of(&props, "color") {
                parts.push(format!("color: {c}"));
            }
            if parts.is_empty() {
                Ok("const Divider()".to_string())
            } else {
                Ok(format!("Divider({})", parts.join(", ")))
            }
        }

        "Card" => {
            let mut c = Ctor::new("Card", indent);
            if let Some(n) = num_of(&props, &["elevation"]) {
                c.arg(format!("elevation: {n}"));
            }
            if let Some(child) = child_arg(snap, forest, idx, indent, binding)? {
                c.arg(child);
            }
            Ok(c.build())
        }

        "ListTile" => {
            let mut c = Ctor::new("ListTile", indent);
            if props.contains_key("icon") {
                c.arg(format!("leading: {}", icon_expr(&props)));
            }
            if let Some(t) = display_expr(&props, &["title", "text"], binding) {
                c.arg(format!("title: Text({t})"));
            }
            if let Some(s) = display_expr(&props, &["subtitle"], binding) {
                c.arg(format!("subtitle: Text({s})"));
            }
            if let Some(cb) = callback_of(snap, &props, &["onTap", "action"])? {
                c.arg(format!("onTap: {cb}"));
            }
            Ok(c.build())
        }

        kind @ ("Column" | "Row") => {
            let mut c = Ctor::new(kind, indent);
            if let Some(a) = str_of(&props, &["mainAxisAlignment", "main_axis_alignment"]) {
                c.arg(format!("mainAxisAlignment: MainAxisAlignment.{}", to_camel_case(a)));
            }
            if let Some(a) = str_of(&props, &["crossAxisAlignment", "cross_axis_alignment"]) {
                c.arg(format!("crossAxisAlignment: CrossAxisAlignment.{}", to_camel_case(a)));
            }
            if let Some(children) = children_arg(snap, forest, idx, indent, binding)? {
                c.arg(children);
            }
            Ok(c.build())
        }

        "Container" => {
            let mut c = Ctor::new("Container", indent);
            if let Some(n) = num_of(&props, &["width"]) {
                c.arg(format!("width: {n}"));
            }
            if let Some(n) = num_of(&props, &["height"]) {
                c.arg(format!("height: {n}"));
            }
            if let Some(n) = num_of(&props, &["padding"]) {
                c.arg(format!("padding: EdgeInsets.all({n})"));
            }
            if let Some(n) = num_of(&props, &["margin"]) {
                c.arg(format!("margin: EdgeInsets.all({n})"));
            }
            if let Some(col) = color_of(&props, "color") {
                c.arg(format!("color: {col}"));
            }
            if let Some(a) = alignment_of(&props) {
                c.arg(format!("alignment: {a}"));
            }
            if let Some(child) = child_arg(snap, forest, idx, indent, binding)? {
                c.arg(child);
            }
            Ok(c.build())
        }

        "Padding" => {
            let n = num_of(&props, &["padding"]).unwrap_or_else(|| "8.0".to_string());
            let mut c = Ctor::new("Padding", indent);
            c.arg(format!("padding: EdgeInsets.all({n})"));
            c.arg(
                child_arg(snap, forest, idx, indent, binding)?
                    .unwrap_or_else(|| "child: const SizedBox.shrink()".to_string()),
            );
            Ok(c.build())
        }

        "Center" => {
            let mut c = Ctor::new("Center", indent);
            if let Some(child) = child_arg(snap, forest, idx, indent, binding)? {
                c.arg(child);
            }
            Ok(c.build())
        }

        "Expanded" => {
            let mut c = Ctor::new("Expanded", indent);
            if let Some(ResolvedValue::Int(flex)) = props.get("flex") {
                c.arg(format!("flex: {flex}"));
            }
            c.arg(
                child_arg(snap, forest, idx, indent, binding)?
                    .unwrap_or_else(|| "child: const SizedBox.shrink()".to_string()),
            );
            Ok(c.build())
        }

        "SizedBox" => {
            let mut c = Ctor::new("SizedBox", indent);
            if let Some(n) = num_of(&props, &["width"]) {
                c.arg(format!("width: {n}"));
            }
            if let Some(n) = num_of(&props, &["height"]) {
                c.arg(format!("height: {n}"));
            }
            if let Some(child) = child_arg(snap, forest, idx, indent, binding)? {
                c.arg(child);
            }
            if c.is_empty() {
                Ok("const SizedBox.shrink()".to_string())
            } else {
                Ok(c.build())
            }
        }

        "TextField" => {
            let mut deco = Vec::new();
            if let Some(l) = str_of(&props, &["label", "labelText", "label_text"]) {
                deco.push(format!("labelText: '{}'", escape_string(l)));
            }
            if let Some(h) = str_of(&props, &["hint", "hintText", "hint_text"]) {
                deco.push(format!("hintText: '{}'", escape_string(h)));
            }
            let mut c = Ctor::new("TextField", indent);
            if !deco.is_empty() {
                c.arg(format!("decoration: InputDecoration({})", deco.join(", ")));
            }
            if let Some(true) = bool_of(&props, &["obscureText", "obscure_text"]) {
                c.arg("obscureText: true".to_string());
            }
            Ok(c.build())
        }

        "Switch" => {
            let value = bool_of(&props, &["value"]).unwrap_or(false);
            Ok(format!("Switch(value: {value}, onChanged: null)"))
        }

        "Checkbox" => {
            let value = bool_of(&props, &["value"]).unwrap_or(false);
            Ok(format!("Checkbox(value: {value}, onChanged: null)"))
        }

        "Slider" => {
            let value = num_of(&props, &["value"]).unwrap_or_else(|| "0.0".to_string());
            let mut parts = vec![format!("value: {value}")];
            if let Some(n) = num_of(&props, &["min"]) {
                parts.push(format!("min: {n}"));
            }
            if let Some(n) = num_of(&props, &["max"]) {
                parts.push(format!("max: {n}"));
            }
            parts.push("onChanged: null".to_string());
            Ok(format!("Slider({})", parts.join(", ")))
        }

        "ListView" => {
            if let Some(ResolvedValue::Field { field, source }) = props.get("items") {
                return data_driven_list(
                    snap, forest, idx, indent, "ListView.builder", None,
                    &source.name, &field.name,
                );
            }
            let mut c = Ctor::new("ListView", indent);
            c.arg("shrinkWrap: true".to_string());
            if let Some(children) = children_arg(snap, forest, idx, indent, binding)? {
                c.arg(children);
            }
            Ok(c.build())
        }

        "GridView" => {
            let columns = num_of(&props, &["crossAxisCount", "columns"])
                .unwrap_or_else(|| "2".to_string());
            if let Some(ResolvedValue::Field { field, source }) = props.get("items") {
                return data_driven_list(
                    snap, forest, idx, indent, "GridView.builder",
                    Some(&columns), &source.name, &field.name,
                );
            }
            let mut c = Ctor::new("GridView.count", indent);
            c.arg(format!("crossAxisCount: {columns}"));
            c.arg("shrinkWrap: true".to_string());
            if let Some(children) = children_arg(snap, forest, idx, indent, binding)? {
                c.arg(children);
            }
            Ok(c.build())
        }

        other => Err(GenerateError::UnsupportedWidgetType {
            widget: node.widget.id,
            kind: other.to_string(),
        }),
    }
}

/// Constructor-expression assembler: one named argument per line, trailing
/// commas, closing paren back at the base indent.
struct Ctor<'a> {
    name: &'a str,
    args: Vec<String>,
    indent: usize,
}

impl<'a> Ctor<'a> {
    fn new(name: &'a str, indent: usize) -> Self {
        Self { name, args: Vec::new(), indent }
    }

    fn arg(&mut self, text: String) {
        self.args.push(text);
    }

    fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn build(self) -> String {
        if self.args.is_empty() {
            return format!("{}()", self.name);
        }
        let mut out = format!("{}(", self.name);
        for arg in &self.args {
            out.push('\n');
            out.push_str(&pad(self.indent + 1));
            out.push_str(arg);
            out.push(',');
        }
        out.push('\n');
        out.push_str(&pad(self.indent));
        out.push(')');
        out
    }
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

/// `child:` argument for a single-slot widget. No children omits the slot;
/// several children are wrapped in a Column so none are silently dropped.
fn child_arg(
    snap: &Snapshot,
    forest: &WidgetForest,
    idx: usize,
    indent: usize,
    binding: Binding,
) -> Result<Option<String>, GenerateError> {
    let children = &forest.node(idx).children;
    match children.len() {
        0 => Ok(None),
        1 => {
            let code = widget_code(snap, forest, children[0], indent + 1, binding)?;
            Ok(Some(format!("child: {code}")))
        }
        _ => {
            let mut out = String::from("child: Column(\n");
            out.push_str(&pad(indent + 2));
            out.push_str("children: [");
            for &child in children {
                out.push('\n');
                out.push_str(&pad(indent + 3));
                out.push_str(&widget_code(snap, forest, child, indent + 3, binding)?);
                out.push(',');
            }
            out.push('\n');
            out.push_str(&pad(indent + 2));
            out.push_str("],\n");
            out.push_str(&pad(indent + 1));
            out.push(')');
            Ok(Some(out))
        }
    }
}

/// `children: [...]` argument for multi-slot widgets.
fn children_arg(
    snap: &Snapshot,
    forest: &WidgetForest,
    idx: usize,
    indent: usize,
    binding: Binding,
) -> Result<Option<String>, GenerateError> {
    let children = &forest.node(idx).children;
    if children.is_empty() {
        return Ok(None);
    }
    let mut out = String::from("children: [");
    for &child in children {
        out.push('\n');
        out.push_str(&pad(indent + 2));
        out.push_str(&widget_code(snap, forest, child, indent + 2, binding)?);
        out.push(',');
    }
    out.push('\n');
    out.push_str(&pad(indent + 1));
    out.push(']');
    Ok(Some(out))
}

/// Async list bound to a data source: fetch, spin, surface errors, then
/// build one row per element. Descendant widgets read fields off the row.
#[allow(clippy::too_many_arguments)]
fn data_driven_list(
    snap: &Snapshot,
    forest: &WidgetForest,
    idx: usize,
    indent: usize,
    builder: &str,
    columns: Option<&str>,
    source_name: &str,
    field_name: &str,
) -> Result<String, GenerateError> {
    let fetcher = format!("_api.fetch{}()", to_pascal_case(source_name));

    let children = &forest.node(idx).children;
    let item_code = if children.is_empty() {
        format!(
            "ListTile(title: Text((item['{}'] ?? '').toString()))",
            escape_string(field_name)
        )
    } else if children.len() == 1 {
        widget_code(snap, forest, children[0], indent + 4, Binding::ListItem)?
    } else {
        let mut col = Ctor::new("Column", indent + 4);
        if let Some(arg) = children_arg(snap, forest, idx, indent + 4, Binding::ListItem)? {
            col.arg(arg);
        }
        col.build()
    };

    let p1 = pad(indent + 1);
    let p2 = pad(indent + 2);
    let p3 = pad(indent + 3);
    let p4 = pad(indent + 4);

    let mut out = String::new();
    out.push_str("FutureBuilder<List<dynamic>>(\n");
    out.push_str(&format!("{p1}future: {fetcher},\n"));
    out.push_str(&format!("{p1}builder: (context, snapshot) {{\n"));
    out.push_str(&format!(
        "{p2}if (snapshot.connectionState == ConnectionState.waiting) {{\n"
    ));
    out.push_str(&format!(
        "{p3}return const Center(child: CircularProgressIndicator());\n"
    ));
    out.push_str(&format!("{p2}}}\n"));
    out.push_str(&format!("{p2}if (snapshot.hasError) {{\n"));
    out.push_str(&format!(
        "{p3}return Center(child: Text('Error: ${{snapshot.error}}'));\n"
    ));
    out.push_str(&format!("{p2}}}\n"));
    out.push_str(&format!("{p2}final items = snapshot.data ?? const [];\n"));
    out.push_str(&format!("{p2}return {builder}(\n"));
    if let Some(columns) = columns {
        out.push_str(&format!(
            "{p3}gridDelegate: SliverGridDelegateWithFixedCrossAxisCount(crossAxisCount: {columns}),\n"
        ));
    }
    out.push_str(&format!("{p3}shrinkWrap: true,\n"));
    out.push_str(&format!("{p3}itemCount: items.length,\n"));
    out.push_str(&format!("{p3}itemBuilder: (context, index) {{\n"));
    out.push_str(&format!("{p4}final item = items[index];\n"));
    out.push_str(&format!("{p4}return {item_code};\n"));
    out.push_str(&format!("{p3}}},\n"));
    out.push_str(&format!("{p2});\n"));
    out.push_str(&format!("{p1}}},\n"));
    out.push_str(&pad(indent));
    out.push(')');
    Ok(out)
}

fn str_of<'a>(props: &ResolvedProps<'a>, names: &[&str]) -> Option<&'a str> {
    for name in names {
        match props.get(*name) {
            Some(ResolvedValue::Str(s)) | Some(ResolvedValue::Url(s)) => return Some(*s),
            _ => {}
        }
    }
    None
}

fn num_of(props: &ResolvedProps<'_>, names: &[&str]) -> Option<String> {
    for name in names {
        match props.get(*name) {
            Some(ResolvedValue::Int(i)) => return Some(i.to_string()),
            Some(ResolvedValue::Decimal(d)) => return Some(fmt_decimal(*d)),
            _ => {}
        }
    }
    None
}

fn bool_of(props: &ResolvedProps<'_>, names: &[&str]) -> Option<bool> {
    for name in names {
        if let Some(ResolvedValue::Bool(b)) = props.get(*name) {
            return Some(*b);
        }
    }
    None
}

fn color_of(props: &ResolvedProps<'_>, name: &str) -> Option<String> {
    match props.get(name) {
        Some(ResolvedValue::Color(hex)) => Some(color_literal(hex)),
        _ => None,
    }
}

fn alignment_of(props: &ResolvedProps<'_>) -> Option<String> {
    match props.get("alignment") {
        Some(ResolvedValue::Alignment(a)) => Some(format!("Alignment.{}", to_camel_case(a))),
        _ => None,
    }
}

/// A display slot: string literal or a field read against the current
/// binding. The returned text is a ready Dart expression.
fn display_expr(props: &ResolvedProps<'_>, names: &[&str], binding: Binding) -> Option<String> {
    for name in names {
        match props.get(*name) {
            Some(ResolvedValue::Str(s)) => return Some(format!("'{}'", escape_string(s))),
            Some(ResolvedValue::Field { field, .. }) => return Some(binding.access(&field.name)),
            _ => {}
        }
    }
    None
}

/// A tap/press slot: an Action reference compiles through the action
/// table, a bare screen reference becomes plain navigation.
fn callback_of(
    snap: &Snapshot,
    props: &ResolvedProps<'_>,
    names: &[&str],
) -> Result<Option<String>, GenerateError> {
    for name in names {
        match props.get(*name) {
            Some(ResolvedValue::Action(action)) => {
                return actions::action_closure(snap, action).map(Some);
            }
            Some(ResolvedValue::Screen(screen)) => {
                return Ok(Some(format!(
                    "() {{ Navigator.pushNamed(context, '{}'); }}",
                    escape_string(&screen.route)
                )));
            }
            _ => {}
        }
    }
    Ok(None)
}

fn icon_name(props: &ResolvedProps<'_>) -> String {
    let name = str_of(props, &["icon"]).unwrap_or("circle");
    format!("Icons.{}", to_camel_case(name))
}

fn icon_expr(props: &ResolvedProps<'_>) -> String {
    format!("Icon({})", icon_name(props))
}

fn fmt_decimal(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
