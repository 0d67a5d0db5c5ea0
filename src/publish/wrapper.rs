//! The LaTeX wrapper document and its compile script.
//!
//! `Requirements.tex` loads the template class and packages, defines the
//! document attributes, extends list nesting to nine levels and inputs every
//! published document followed by the traceability matrix.

use std::{
    fs,
    path::{Path, PathBuf},
};

use super::{PublishError, matrix, write_lines};
use crate::{
    convert::{MAX_LIST_DEPTH, convert},
    domain::{DocumentAttributes, Tree},
    storage::Template,
};

/// File name of the wrapper document.
pub const WRAPPER_FILE: &str = "Requirements.tex";
/// File name of the compile script.
pub const COMPILE_FILE: &str = "compile.sh";

const ITEMIZE_LABELS: [&str; MAX_LIST_DEPTH] = [
    r"\textbullet",
    r"\normalfont\bfseries \textendash",
    r"\textasteriskcentered",
    r"\textperiodcentered",
    r"\textopenbullet",
    r"\textbullet",
    r"\normalfont\bfseries \textendash",
    r"\textasteriskcentered",
    r"\textperiodcentered",
];

/// Writes the wrapper document and compile script into `dir`.
///
/// # Errors
///
/// Fails if a file cannot be written.
pub fn write(tree: &Tree, dir: &Path, template: &Template) -> Result<Vec<PathBuf>, PublishError> {
    let wrapper = dir.join(WRAPPER_FILE);
    write_lines(&wrapper, &wrapper_lines(tree, template))?;

    let script = dir.join(COMPILE_FILE);
    write_lines(&script, &compile_script())?;
    make_executable(&script)?;

    tracing::info!(
        "run {} twice in {} to produce the PDF",
        COMPILE_FILE,
        dir.display()
    );
    Ok(vec![wrapper, script])
}

/// The lines of the compile script.
#[must_use]
pub fn compile_script() -> Vec<String> {
    vec![
        "#!/bin/sh".to_string(),
        format!("xelatex -interaction=nonstopmode {WRAPPER_FILE}"),
    ]
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), PublishError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        PublishError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), PublishError> {
    Ok(())
}

/// The lines of the wrapper document.
///
/// Document attributes are taken from the root document of the tree.
#[must_use]
pub fn wrapper_lines(tree: &Tree, template: &Template) -> Vec<String> {
    let data = &template.data;
    let mut lines = Vec::new();

    lines.push(format!(
        r"\documentclass[{}]{{template/{}}}",
        data.documentclass.join(", "),
        template.name
    ));
    comment(&mut lines, "These packages are required.");
    lines.push(r"\usepackage{enumitem}".to_string());
    comment(&mut lines, "END required packages.");
    lines.push(String::new());

    comment(&mut lines, "These packages were added from the template data.");
    for (package, options) in &data.usepackage {
        if options.is_empty() {
            lines.push(format!(r"\usepackage{{{package}}}"));
        } else {
            lines.push(format!(r"\usepackage[{}]{{{package}}}", options.join(", ")));
        }
    }
    comment(&mut lines, "END template data.");
    lines.push(String::new());

    if let Some(root) = tree.documents().first() {
        comment(&mut lines, "These fields are generated from the doc attributes.");
        lines.extend(attribute_defs(&root.attributes, root.prefix()));
        comment(&mut lines, "END doc attributes.");
        lines.push(String::new());
    }

    comment(
        &mut lines,
        "LaTeX allows four levels of lists. The following extends this to nine.",
    );
    lines.extend(list_definitions());
    comment(&mut lines, "END list depth fix.");
    lines.push(String::new());

    comment(&mut lines, "Template data inserted before \\begin{document}.");
    lines.extend(data.before_begin_document.iter().cloned());
    comment(&mut lines, "END template data.");
    lines.push(String::new());

    lines.push(r"\begin{document}".to_string());
    comment(&mut lines, "Template data inserted after \\begin{document}.");
    lines.extend(data.after_begin_document.iter().cloned());
    comment(&mut lines, "END template data.");
    lines.push(String::new());

    if !tree.documents().is_empty() {
        comment(&mut lines, "Published documents.");
        for document in tree.documents() {
            lines.push(format!(r"\input{{{}.tex}}", document.file_stem()));
            lines.push(r"\newpage".to_string());
        }
        comment(&mut lines, "END published documents.");
        lines.push(String::new());
    }

    match &data.include_graphics {
        Some(graphics) if !graphics.is_empty() => {
            for (index, (file, label)) in graphics.iter().enumerate() {
                let title = label
                    .as_deref()
                    .map_or_else(|| format!("Image {}", index + 1), convert);
                lines.push(format!(r"\section{{{title}}}"));
                lines.push(r"\begin{figure}[ht!]".to_string());
                lines.push(r"\begin{center}".to_string());
                lines.push(format!(
                    r"\includegraphics[angle=90, height=20cm, width=\textwidth]{{{file}}}"
                ));
                lines.push(r"\end{center}".to_string());
                lines.push(r"\end{figure}".to_string());
                lines.push(r"\newpage".to_string());
            }
            comment(&mut lines, "END graphics from the template data.");
        }
        _ => {
            comment(&mut lines, "No graphics in the template data.");
            lines.push(String::new());
            lines.push(r"\newpage".to_string());
        }
    }
    lines.push(String::new());

    if data.tracability_matrix {
        comment(&mut lines, "Traceability matrix.");
        lines.push(r"\section{Traceability Matrix}".to_string());
        lines.push(format!(r"\input{{{}}}", matrix::LATEX_FILE));
        comment(&mut lines, "END traceability matrix.");
        lines.push(String::new());
    }

    lines.push(r"\end{document}".to_string());
    lines
}

fn comment(lines: &mut Vec<String>, text: &str) {
    lines.push(format!("% {text}"));
}

fn attribute_defs(attributes: &DocumentAttributes, category: &str) -> Vec<String> {
    [
        ("doccopyright", attributes.copyright.as_str()),
        ("doccategory", category),
        ("docref", attributes.reference.as_str()),
        ("docby", attributes.by.as_str()),
        ("docissuemajor", attributes.major.as_str()),
        ("docissueminor", attributes.minor.as_str()),
    ]
    .into_iter()
    .map(|(name, value)| format!(r"\def\{name}{{{}}}", convert(value)))
    .collect()
}

fn list_definitions() -> Vec<String> {
    let mut lines = vec![
        format!(r"\setlistdepth{{{MAX_LIST_DEPTH}}}"),
        format!(r"\newlist{{itemizeDeep}}{{enumerate}}{{{MAX_LIST_DEPTH}}}"),
    ];
    lines.extend(ITEMIZE_LABELS.iter().zip(1..).map(|(label, depth)| {
        format!(r"\setlist[itemizeDeep,{depth}]{{label={label}}}")
    }));
    lines.push(format!(
        r"\newlist{{enumerateDeep}}{{enumerate}}{{{MAX_LIST_DEPTH}}}"
    ));
    lines.push(r"\setlist[enumerateDeep]{label*=\arabic*.}".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::tests::sample_tree;

    #[test]
    fn wrapper_inputs_documents_and_matrix() {
        let lines = wrapper_lines(&sample_tree(), &Template::default());

        assert_eq!(lines[0], r"\documentclass[a4paper, twoside]{template/doorstop}");
        assert!(lines.contains(&r"\usepackage[utf8]{inputenc}".to_string()));
        assert!(lines.contains(&r"\usepackage{amsmath}".to_string()));
        assert!(lines.contains(&r"\def\doccategory{REQ}".to_string()));
        assert!(lines.contains(&r"\def\docref{GitLab}".to_string()));
        assert!(lines.contains(&r"\input{REQ.tex}".to_string()));
        assert!(lines.contains(&r"\input{SYS.tex}".to_string()));
        assert!(lines.contains(&r"\input{traceability.tex}".to_string()));
        assert!(lines.contains(&r"\tableofcontents".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some(r"\end{document}"));

        let begin = lines.iter().position(|l| l == r"\begin{document}").unwrap();
        let input = lines.iter().position(|l| l == r"\input{REQ.tex}").unwrap();
        assert!(begin < input);
    }

    #[test]
    fn lists_nest_nine_levels() {
        let lines = list_definitions();
        assert_eq!(lines[0], r"\setlistdepth{9}");
        assert!(lines.contains(&r"\setlist[itemizeDeep,5]{label=\textopenbullet}".to_string()));
        assert!(lines.contains(&r"\setlist[itemizeDeep,6]{label=\textbullet}".to_string()));
        assert!(lines.contains(&r"\setlist[itemizeDeep,9]{label=\textperiodcentered}".to_string()));
        assert!(!lines.iter().any(|l| l.contains("itemizeDeep,10")));
    }

    #[test]
    fn graphics_get_sections() {
        let mut template = Template::default();
        template.data.include_graphics = Some(vec![
            ("overview.png".to_string(), Some("System Overview".to_string())),
            ("detail.png".to_string(), None),
        ]);
        template.data.tracability_matrix = false;
        let lines = wrapper_lines(&sample_tree(), &template);

        assert!(lines.contains(&r"\section{System Overview}".to_string()));
        assert!(lines.contains(&r"\section{Image 2}".to_string()));
        assert!(lines.contains(
            &r"\includegraphics[angle=90, height=20cm, width=\textwidth]{detail.png}".to_string()
        ));
        assert!(!lines.iter().any(|l| l.contains("traceability.tex")));
    }

    #[test]
    fn writes_executable_compile_script() {
        let dir = tempfile::tempdir().unwrap();
        let written = write(&sample_tree(), dir.path(), &Template::default()).unwrap();
        assert_eq!(written.len(), 2);

        let script = fs::read_to_string(dir.path().join(COMPILE_FILE)).unwrap();
        assert_eq!(
            script,
            "#!/bin/sh\nxelatex -interaction=nonstopmode Requirements.tex\n"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join(COMPILE_FILE))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }
}
