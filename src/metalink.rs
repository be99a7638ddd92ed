use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use url::Url;

use crate::error::Result;

const NETCDF_MEDIA_TYPE: &str = "application/x-netcdf";

/// One physical file of a logical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaFile {
    pub name: String,
    pub description: String,
    pub media_type: String,
}

impl MetaFile {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            media_type: media_type.into(),
        }
    }
}

/// A logical process output grouping one or more physical files, rendered as
/// a Metalink 4 (RFC 5854) document.
#[derive(Debug, Clone)]
pub struct MetaLink {
    pub identity: String,
    pub description: String,
    pub workdir: PathBuf,
    files: Vec<MetaFile>,
}

impl MetaLink {
    pub fn new(
        identity: impl Into<String>,
        description: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity: identity.into(),
            description: description.into(),
            workdir: workdir.into(),
            files: Vec::new(),
        }
    }

    pub fn append(&mut self, file: MetaFile) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[MetaFile] {
        &self.files
    }

    /// Render the metalink document: one `<file name="...">` element per
    /// appended file under a single top-level `<metalink>` element, each file
    /// carrying a `file://` metaurl into the working directory.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<metalink xmlns=\"urn:ietf:params:xml:ns:metalink\">\n");
        let _ = writeln!(xml, "  <identity>{}</identity>", escape(&self.identity));
        let _ = writeln!(
            xml,
            "  <description>{}</description>",
            escape(&self.description)
        );
        xml.push_str("  <generator>wps-kit/0.1</generator>\n");
        let _ = writeln!(
            xml,
            "  <published>{}</published>",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        for file in &self.files {
            let _ = writeln!(xml, "  <file name=\"{}\">", escape(&file.name));
            let _ = writeln!(
                xml,
                "    <description>{}</description>",
                escape(&file.description)
            );
            let _ = writeln!(
                xml,
                "    <metaurl mediatype=\"{}\">{}</metaurl>",
                escape(&file.media_type),
                escape(&file_location(&self.workdir.join(&file.name)))
            );
            xml.push_str("  </file>\n");
        }

        xml.push_str("</metalink>\n");
        xml
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn file_location(path: &Path) -> String {
    match Url::from_file_path(path) {
        Ok(url) => url.to_string(),
        // Relative workdirs cannot form a file URL; keep the raw path.
        Err(()) => format!("file://{}", path.display()),
    }
}

/// Build the standard process output metalink: identity `output`, one
/// netCDF-typed file element per output file name.
pub fn build_meta_link(
    varname: &str,
    description: &str,
    outfiles: &[String],
    outdir: &Path,
) -> String {
    build_meta_link_with_format(varname, description, outfiles, outdir, "netCDF", NETCDF_MEDIA_TYPE)
}

/// As [`build_meta_link`], with an explicit format name and media type.
pub fn build_meta_link_with_format(
    varname: &str,
    description: &str,
    outfiles: &[String],
    outdir: &Path,
    format_name: &str,
    media_type: &str,
) -> String {
    let noun = if outfiles.len() == 1 { "file" } else { "files" };
    let mut meta_link = MetaLink::new(
        "output",
        format!("Output of {format_name} {varname} {noun}"),
        outdir,
    );
    for file in outfiles {
        meta_link.append(MetaFile::new(file, description, media_type));
    }
    meta_link.to_xml()
}

/// File names in `outdir` containing `varname`, sorted for determinism.
/// Output files of a process embed the variable name, so this picks up what
/// the process just produced in its working directory.
pub fn collect_output_files(varname: &str, outdir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(outdir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.contains(varname) {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

static METAURL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<metaurl[^>]*>(.*?)</metaurl>").expect("valid regex"));

/// Extract the metaurl targets of a metalink document, whitespace stripped.
pub fn metalink_urls(xml: &str) -> Vec<String> {
    METAURL
        .captures_iter(xml)
        .map(|cap| {
            let text: String = cap[1].split_whitespace().collect();
            unescape(&text)
        })
        .collect()
}
