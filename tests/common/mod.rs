// tests/common/mod.rs

//! Shared test utilities for integration tests.
//!
//! Cartridges are built on the fly as zip archives inside a `TempDir`.

#![allow(dead_code)]

use cartridge::db;
use rusqlite::Connection;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a cartridge archive entry by entry
pub struct CartridgeBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl CartridgeBuilder {
    pub fn new(manifest: &str) -> Self {
        Self {
            entries: vec![("imsmanifest.xml".to_string(), manifest.as_bytes().to_vec())],
        }
    }

    pub fn file(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push((name.to_string(), contents.as_ref().to_vec()));
        self
    }

    /// Write the archive as `<dir>/course.imscc`
    pub fn build(self, dir: &Path) -> PathBuf {
        let path = dir.join("course.imscc");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for (name, data) in &self.entries {
            zip.start_file(name.clone(), options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        path
    }
}

/// Wrap organization items and resources in a manifest document
pub fn manifest(items: &str, resources: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="cctd0001"
    xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1"
    xmlns:lomimscc="http://ltsc.ieee.org/xsd/imsccv1p1/LOM/manifest">
  <metadata>
    <schema>IMS Common Cartridge</schema>
    <schemaversion>1.1.0</schemaversion>
    <lomimscc:lom>
      <lomimscc:general>
        <lomimscc:title><lomimscc:string>Sample Course</lomimscc:string></lomimscc:title>
      </lomimscc:general>
    </lomimscc:lom>
  </metadata>
  <organizations>
    <organization identifier="org_1" structure="rooted-hierarchy">
      <item identifier="LearningModules">
{items}
      </item>
    </organization>
  </organizations>
  <resources>
{resources}
  </resources>
</manifest>"#
    )
}

/// An LTI link descriptor launching at `url`
pub fn blti(title: &str, url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cartridge_basiclti_link xmlns="http://www.imsglobal.org/xsd/imslticc_v1p0"
    xmlns:blti="http://www.imsglobal.org/xsd/imsbasiclti_v1p0"
    xmlns:lticm="http://www.imsglobal.org/xsd/imslticm_v1p0">
  <blti:title>{title}</blti:title>
  <blti:launch_url>{url}</blti:launch_url>
  <blti:extensions platform="canvas.instructure.com">
    <lticm:property name="privacy_level">public</lticm:property>
  </blti:extensions>
</cartridge_basiclti_link>"#
    )
}

const INTRO_HTML: &str = r#"<html><head><title>Welcome</title></head>
<body><p>Hello</p><img src="../media/dana%20small.png"><a href="../../missing/gone.pdf">gone</a></body></html>"#;

const TOPIC_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<topic xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imsdt_v1p1">
  <title>Discuss the reading</title>
  <text texttype="text/html">&lt;p&gt;Look at &lt;a href="$IMS-CC-FILEBASE$/media/dana small.png"&gt;&lt;/a&gt;&lt;/p&gt;</text>
</topic>"#;

const ASSIGNMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<assignment xmlns="http://www.imsglobal.org/xsd/imscc_extensions/assignment" identifier="a1">
  <title>Essay</title>
  <text texttype="text/html">&lt;p&gt;Write an essay&lt;/p&gt;</text>
  <gradable points_possible="15">true</gradable>
  <submission_formats>
    <format type="file"/>
    <format type="text"/>
  </submission_formats>
  <extensions platform="canvas.instructure.com">
    <assignment>
      <grading_type>letter_grade</grading_type>
    </assignment>
  </extensions>
</assignment>"#;

const QUIZ_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<questestinterop xmlns="http://www.imsglobal.org/xsd/ims_qtiasiv1p2">
  <assessment ident="q1" title="Pop Quiz">
    <qtimetadata>
      <qtimetadatafield><fieldlabel>cc_profile</fieldlabel><fieldentry>cc.exam.v0p1</fieldentry></qtimetadatafield>
      <qtimetadatafield><fieldlabel>qmd_timelimit</fieldlabel><fieldentry>90</fieldentry></qtimetadatafield>
      <qtimetadatafield><fieldlabel>cc_maxattempts</fieldlabel><fieldentry>unlimited</fieldentry></qtimetadatafield>
    </qtimetadata>
    <section ident="root_section">
      <item ident="qi1" title="Capital">
        <itemmetadata><qtimetadata>
          <qtimetadatafield><fieldlabel>cc_profile</fieldlabel><fieldentry>cc.multiple_choice.v0p1</fieldentry></qtimetadatafield>
        </qtimetadata></itemmetadata>
        <presentation><material><mattext texttype="text/html">What is the capital?</mattext></material></presentation>
      </item>
      <item ident="qi2" title="Explain">
        <itemmetadata><qtimetadata>
          <qtimetadatafield><fieldlabel>cc_profile</fieldlabel><fieldentry>cc.essay.v0p1</fieldentry></qtimetadatafield>
        </qtimetadata></itemmetadata>
        <presentation><material><mattext texttype="text/html">Explain why</mattext></material></presentation>
      </item>
    </section>
  </assessment>
</questestinterop>"#;

/// A cartridge exercising most resource families
///
/// Organization:
/// - `m1` "Week 1": intro page (`w1`), sub-folder `sf1` "Readings" holding the
///   image (`f1`)
/// - top-level discussion item (`dt1`), gathered into the Misc Module
/// - `m2` "Tools": two LTI links on the same domain, the CC assignment and
///   the quiz
pub fn sample_cartridge(dir: &Path) -> PathBuf {
    let items = r#"
        <item identifier="m1">
          <title>Week 1</title>
          <item identifier="i_w1" identifierref="w1"><title>Introduction</title></item>
          <item identifier="sf1">
            <title>Readings</title>
            <item identifier="i_f1" identifierref="f1"><title>Dana</title></item>
          </item>
        </item>
        <item identifier="i_dt1" identifierref="dt1"><title>Discussion</title></item>
        <item identifier="m2">
          <title>Tools</title>
          <item identifier="i_lti1" identifierref="lti1"><title>Tool One</title></item>
          <item identifier="i_lti2" identifierref="lti2"><title>Tool Two</title></item>
          <item identifier="i_a1" identifierref="a1"><title>Essay</title></item>
          <item identifier="i_q1" identifierref="q1"><title>Pop Quiz</title></item>
        </item>"#;

    let resources = r#"
    <resource identifier="w1" type="webcontent" href="w1/intro.html">
      <file href="w1/intro.html"/>
    </resource>
    <resource identifier="f1" type="webcontent" href="media\dana small.png">
      <file href="media\dana small.png"/>
    </resource>
    <resource identifier="dt1" type="imsdt_xmlv1p1">
      <file href="dt1/topic.xml"/>
    </resource>
    <resource identifier="lti1" type="imsbasiclti_xmlv1p0">
      <file href="lti1.xml"/>
    </resource>
    <resource identifier="lti2" type="imsbasiclti_xmlv1p0">
      <file href="lti2.xml"/>
    </resource>
    <resource identifier="a1" type="assignment_xmlv1p0" href="a1/assignment.xml">
      <file href="a1/assignment.xml"/>
      <file href="a1/rubric.pdf"/>
    </resource>
    <resource identifier="q1" type="imsqti_xmlv1p2/imscc_xmlv1p1/assessment">
      <file href="q1/assessment.xml"/>
    </resource>
    <resource identifier="syl" type="webcontent" intendeduse="syllabus" href="course_settings/syllabus.html">
      <file href="course_settings/syllabus.html"/>
    </resource>
    <resource identifier="apip1" type="imsapip_zipv1p0">
      <file href="apip/item.xml"/>
    </resource>
    <resource identifier="odd1" type="imsodd_xmlv1p0">
      <file href="odd/thing.xml"/>
    </resource>"#;

    CartridgeBuilder::new(&manifest(items, resources))
        .file("w1/intro.html", INTRO_HTML)
        .file("media\\dana small.png", [0x89u8, b'P', b'N', b'G'])
        .file("dt1/topic.xml", TOPIC_XML)
        .file("lti1.xml", blti("Tool One", "https://tools.example.com/launch?id=1"))
        .file("lti2.xml", blti("Tool Two", "https://TOOLS.example.com/launch?id=2"))
        .file("a1/assignment.xml", ASSIGNMENT_XML)
        .file("a1/rubric.pdf", b"%PDF-1.4")
        .file("q1/assessment.xml", QUIZ_XML)
        .file(
            "course_settings/syllabus.html",
            r#"<html><body><p>Syllabus</p><a href="../media/dana%20small.png">image</a></body></html>"#,
        )
        .file("apip/item.xml", "<apip/>")
        .file("odd/thing.xml", "<odd/>")
        .build(dir)
}

/// A fresh file-backed store
///
/// Returns (TempDir, db_path, connection) - keep the TempDir alive to
/// prevent cleanup.
pub fn setup_store() -> (TempDir, String, Connection) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("store.db")
        .to_str()
        .unwrap()
        .to_string();

    db::init(&db_path).unwrap();
    let conn = db::open(&db_path).unwrap();
    (temp_dir, db_path, conn)
}
