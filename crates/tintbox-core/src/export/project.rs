//! XML project description for handing a grade to editing tools.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <tintbox-project version="1">
//!   <stack>
//!     <lut id="0" ref="warm-film" opacity="100" enabled="true" blend="normal"/>
//!   </stack>
//!   <manual> ... </manual>
//!   <effects .../>
//!   <split position="0.5" graded="left"/>
//!   <grade> ... </grade>
//! </tintbox-project>
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::escape::escape;

use crate::edit::EditConfiguration;
use crate::lut::LutSource;
use crate::settings::{ColorSettings, Rgb};
use crate::split::GradedSide;

pub const PROJECT_XML_VERSION: u32 = 1;

/// Write the project description to `path`.
pub fn save_project_xml<S: LutSource + ?Sized>(
    path: &Path,
    edit: &EditConfiguration,
    source: &S,
) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_project_xml(&mut w, edit, source)?;
    w.flush()
}

/// Serialize the edit, plus the grade it resolves to, as XML.
pub fn write_project_xml<W: Write, S: LutSource + ?Sized>(
    w: &mut W,
    edit: &EditConfiguration,
    source: &S,
) -> std::io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(w, r#"<tintbox-project version="{PROJECT_XML_VERSION}">"#)?;

    writeln!(w, "  <stack>")?;
    for entry in edit.stack.entries() {
        writeln!(
            w,
            r#"    <lut id="{}" ref="{}" opacity="{}" enabled="{}" blend="{}"/>"#,
            entry.id,
            escape(entry.lut.as_str()),
            entry.opacity,
            entry.enabled,
            blend_attr(entry.blend_mode),
        )?;
    }
    writeln!(w, "  </stack>")?;

    write_settings(w, "manual", &edit.manual)?;

    let fx = &edit.effects;
    writeln!(
        w,
        concat!(
            r#"  <effects grain="{}" grain-size="{}" vignette="{}" "#,
            r#"vignette-midpoint="{}" vignette-feather="{}" chromatic-aberration="{}"/>"#,
        ),
        fx.grain_amount,
        fx.grain_size,
        fx.vignette_amount,
        fx.vignette_midpoint,
        fx.vignette_feather,
        fx.chromatic_aberration,
    )?;

    if let Some(split) = &edit.split {
        let side = match split.graded_side {
            GradedSide::Left => "left",
            GradedSide::Right => "right",
        };
        writeln!(w, r#"  <split position="{}" graded="{side}"/>"#, split.position)?;
    }

    write_settings(w, "grade", &edit.resolve_grade(source))?;
    writeln!(w, "</tintbox-project>")?;
    Ok(())
}

fn write_settings<W: Write>(w: &mut W, tag: &str, s: &ColorSettings) -> std::io::Result<()> {
    writeln!(w, "  <{tag}>")?;
    writeln!(w, "    <Contrast>{}</Contrast>", s.contrast)?;
    writeln!(w, "    <Saturation>{}</Saturation>", s.saturation)?;
    writeln!(w, "    <Temperature>{}</Temperature>", s.temperature)?;
    writeln!(w, "    <Tint>{}</Tint>", s.tint)?;
    writeln!(w, "    <Shadows>{}</Shadows>", s.shadows)?;
    writeln!(w, "    <Highlights>{}</Highlights>", s.highlights)?;
    writeln!(w, "    <Lift>{}</Lift>", triple(&s.lift))?;
    writeln!(w, "    <Gamma>{}</Gamma>", triple(&s.gamma))?;
    writeln!(w, "    <Gain>{}</Gain>", triple(&s.gain))?;
    writeln!(w, "  </{tag}>")?;
    Ok(())
}

fn triple(rgb: &Rgb) -> String {
    format!("{} {} {}", rgb.r, rgb.g, rgb.b)
}

fn blend_attr(mode: crate::blend::BlendMode) -> &'static str {
    use crate::blend::BlendMode::*;
    match mode {
        Normal => "normal",
        Multiply => "multiply",
        Screen => "screen",
        Overlay => "overlay",
        SoftLight => "soft-light",
        HardLight => "hard-light",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::BlendMode;
    use crate::lut::{LutLibrary, LutRef};
    use crate::split::SplitView;

    fn render(edit: &EditConfiguration) -> String {
        let mut buf = Vec::new();
        write_project_xml(&mut buf, edit, &LutLibrary::builtin()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_edit_writes_neutral_grade() {
        let xml = render(&EditConfiguration::default());
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<stack>\n  </stack>"));
        assert!(xml.contains("<grade>\n    <Contrast>1</Contrast>"));
        assert!(!xml.contains("<split"));
        assert!(xml.trim_end().ends_with("</tintbox-project>"));
    }

    #[test]
    fn test_stack_entries_and_split_are_listed() {
        let mut edit = EditConfiguration::default();
        let id = edit.stack.push(LutRef::from("teal-orange"), BlendMode::SoftLight);
        edit.stack.set_opacity(id, 40.0).unwrap();
        edit.split = Some(SplitView::new(0.25));
        let xml = render(&edit);
        assert!(xml.contains(
            r#"<lut id="0" ref="teal-orange" opacity="40" enabled="true" blend="soft-light"/>"#
        ));
        assert!(xml.contains(r#"<split position="0.25" graded="left"/>"#));
    }

    #[test]
    fn test_refs_are_escaped() {
        let mut edit = EditConfiguration::default();
        edit.stack.push(LutRef::from("a<b>&\"c\""), BlendMode::Normal);
        let xml = render(&edit);
        assert!(xml.contains(r#"ref="a&lt;b&gt;&amp;&quot;c&quot;""#));
    }

    #[test]
    fn test_user_lut_names_stay_well_formed() {
        let mut edit = EditConfiguration::default();
        edit.stack.push(LutRef::from("Kodak 'Vision' & co"), BlendMode::Normal);
        let xml = render(&edit);
        assert!(xml.contains(r#"ref="Kodak &apos;Vision&apos; &amp; co""#));
        assert!(xml.contains(r#"vignette-midpoint="#));
        assert!(!xml.contains("'Vision'"));
    }

    #[test]
    fn test_save_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.xml");
        save_project_xml(&path, &EditConfiguration::default(), &LutLibrary::builtin()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<tintbox-project version=\"1\">"));
    }
}
