// tests/converter.rs

//! Cartridge conversion tests: archive in, intermediate representation out.

mod common;

use cartridge::convert::{COURSE_JSON, OVERVIEW_JSON};
use cartridge::ir::{ContentType, CourseIr, MISC_MODULE_ID, MISC_MODULE_TITLE};
use cartridge::{CartridgeConverter, ConversionOptions, Error};
use common::{CartridgeBuilder, manifest, sample_cartridge};
use std::io::Read;

fn convert(html_to_page: bool) -> (tempfile::TempDir, CourseIr) {
    let temp = tempfile::tempdir().unwrap();
    let archive = sample_cartridge(temp.path());
    let converter = CartridgeConverter::new(ConversionOptions {
        html_to_page,
        ..Default::default()
    });
    let result = converter.convert(&archive).unwrap();
    (temp, result.course)
}

#[test]
fn test_module_tree_with_misc_module() {
    let (_temp, course) = convert(false);

    let titles: Vec<_> = course.modules.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Week 1", MISC_MODULE_TITLE, "Tools"]);
    let positions: Vec<_> = course.modules.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);

    let misc = &course.modules[1];
    assert_eq!(misc.migration_id, MISC_MODULE_ID);
    assert_eq!(misc.items.len(), 1);
    assert_eq!(misc.items[0].content_type, ContentType::DiscussionTopic);
    assert_eq!(misc.items[0].target.as_deref(), Some("dt1"));
}

#[test]
fn test_structural_items_become_indented_subheaders() {
    let (_temp, course) = convert(false);
    let week = &course.modules[0];

    let items: Vec<_> = week
        .items
        .iter()
        .map(|i| (i.content_type, i.title.as_str(), i.indent))
        .collect();
    assert_eq!(
        items,
        vec![
            (ContentType::Attachment, "Introduction", 0),
            (ContentType::SubHeader, "Readings", 0),
            (ContentType::Attachment, "Dana", 1),
        ]
    );

    assert_eq!(week.submodules.len(), 1);
    let readings = &week.submodules[0];
    assert_eq!(readings.migration_id, "sf1");
    assert_eq!(readings.parent_migration_id.as_deref(), Some("m1"));
    assert_eq!(readings.items[0].indent, 0);
    assert!(course.find_module("sf1").is_some());
}

#[test]
fn test_backslash_paths_are_normalized() {
    let (_temp, course) = convert(false);

    let image = course
        .files
        .iter()
        .find(|f| f.migration_id == "f1")
        .expect("image file");
    assert_eq!(image.path_name, "media/dana small.png");
    assert_eq!(image.display_name, "dana small.png");
    assert!(course.files.iter().all(|f| !f.path_name.contains('\\')));
}

#[test]
fn test_descriptor_files_are_not_attachments() {
    let (_temp, course) = convert(false);
    let paths: Vec<_> = course.files.iter().map(|f| f.path_name.as_str()).collect();

    assert!(paths.contains(&"a1/rubric.pdf"));
    assert!(!paths.contains(&"a1/assignment.xml"));
    assert!(!paths.contains(&"dt1/topic.xml"));
    assert!(!paths.contains(&"lti1.xml"));
    assert!(!paths.contains(&"apip/item.xml"));
}

#[test]
fn test_tools_on_same_domain_are_combined() {
    let (_temp, course) = convert(false);

    assert_eq!(course.context_external_tools.len(), 1);
    let tool = &course.context_external_tools[0];
    assert_eq!(tool.migration_id, "lti1");
    assert_eq!(tool.title, "Tool One");
    assert_eq!(tool.domain.as_deref(), Some("tools.example.com"));
    assert!(tool.url.is_none());

    let tools = &course.modules[2];
    let targets: Vec<_> = tools
        .items
        .iter()
        .filter(|i| i.content_type == ContentType::ExternalTool)
        .map(|i| (i.title.as_str(), i.target.as_deref(), i.url.as_deref()))
        .collect();
    assert_eq!(
        targets,
        vec![
            ("Tool One", Some("lti1"), Some("https://tools.example.com/launch?id=1")),
            ("Tool Two", Some("lti1"), Some("https://TOOLS.example.com/launch?id=2")),
        ]
    );
}

#[test]
fn test_unsupported_and_unknown_resources_reported_once() {
    let (_temp, course) = convert(false);
    let descriptions: Vec<_> = course.issues.iter().map(|i| i.description.as_str()).collect();

    assert!(descriptions.contains(
        &"This package includes APIP file(s), which are not supported and were not imported."
    ));
    assert!(descriptions.contains(
        &"Unsupported resource type 'imsodd_xmlv1p0' for resource 'odd1' was skipped"
    ));
    assert!(descriptions.contains(
        &"The security parameters for the external tool \"Tool One\" may need to be set in Course Settings."
    ));
    assert_eq!(
        descriptions.iter().filter(|d| d.contains("APIP")).count(),
        1
    );
}

#[test]
fn test_cc_assignment_with_canvas_extension() {
    let (_temp, course) = convert(false);

    let essay = course
        .assignments
        .iter()
        .find(|a| a.migration_id == "a1")
        .expect("assignment");
    assert_eq!(essay.title, "Essay");
    assert_eq!(essay.description.as_deref(), Some("<p>Write an essay</p>"));
    assert_eq!(essay.points_possible, Some(15.0));
    assert_eq!(essay.grading_type, "letter_grade");
    assert_eq!(
        essay.submission_types,
        vec!["online_upload".to_string(), "online_text_entry".to_string()]
    );
}

#[test]
fn test_quiz_settings() {
    let (_temp, course) = convert(false);

    assert_eq!(course.quizzes.len(), 1);
    let quiz = &course.quizzes[0];
    assert_eq!(quiz.title, "Pop Quiz");
    assert_eq!(quiz.allowed_attempts, Some(-1));
    assert_eq!(quiz.time_limit, Some(2));
    assert_eq!(quiz.question_migration_ids, vec!["q1_qi1", "q1_qi2"]);

    let types: Vec<_> = course
        .assessment_questions
        .iter()
        .map(|q| q.question_type.as_str())
        .collect();
    assert_eq!(types, vec!["multiple_choice_question", "essay_question"]);
}

#[test]
fn test_discussion_and_syllabus_links_use_placeholders() {
    let (_temp, course) = convert(false);

    let topic = &course.discussion_topics[0];
    assert_eq!(topic.title, "Discuss the reading");
    assert!(topic
        .message
        .contains(r#"href="$IMS-CC-FILEBASE$/media/dana small.png""#));

    let syllabus = course.course.syllabus_body.as_deref().expect("syllabus");
    assert!(syllabus.starts_with("<p>Syllabus</p>"));
    assert!(syllabus.contains(r#"href="$IMS-CC-FILEBASE$/media/dana small.png""#));
    assert_eq!(course.course.title.as_deref(), Some("Sample Course"));
}

#[test]
fn test_html_to_page_promotes_referenced_html() {
    let (_temp, course) = convert(true);

    assert_eq!(course.wiki_pages.len(), 1);
    let page = &course.wiki_pages[0];
    assert_eq!(page.migration_id, "w1");
    assert_eq!(page.title, "Introduction");
    assert_eq!(page.source_path.as_deref(), Some("w1/intro.html"));
    assert!(page
        .body
        .contains(r#"src="$IMS-CC-FILEBASE$/media/dana small.png""#));
    assert!(page
        .body
        .contains(r#"href="$IMS-CC-FILEBASE$/missing/gone.pdf""#));

    let paths: Vec<_> = course.files.iter().map(|f| f.path_name.as_str()).collect();
    assert!(!paths.contains(&"w1/intro.html"));
    assert!(paths.contains(&"course_settings/syllabus.html"));

    assert_eq!(course.modules[0].items[0].content_type, ContentType::Page);
}

#[test]
fn test_webcontent_intended_for_assignment() {
    let temp = tempfile::tempdir().unwrap();
    let items = r#"<item identifier="i1" identifierref="r1"><title>Lab Report</title></item>"#;
    let resources = r#"
    <resource identifier="r1" type="webcontent" intendeduse="assignment" href="lab/report.html">
      <file href="lab/report.html"/>
    </resource>"#;
    let archive = CartridgeBuilder::new(&manifest(items, resources))
        .file("lab/report.html", "<html><body><p>Submit the lab</p></body></html>")
        .build(temp.path());

    let course = CartridgeConverter::with_defaults()
        .convert(&archive)
        .unwrap()
        .course;

    assert_eq!(course.assignments.len(), 1);
    let assignment = &course.assignments[0];
    assert_eq!(assignment.title, "Lab Report");
    assert_eq!(assignment.description.as_deref(), Some("<p>Submit the lab</p>"));
    assert_eq!(assignment.submission_types, vec!["online_upload".to_string()]);
    assert_eq!(course.modules[0].items[0].content_type, ContentType::Assignment);
}

#[test]
fn test_output_directory_contents() {
    let temp = tempfile::tempdir().unwrap();
    let archive = sample_cartridge(temp.path());
    let out = temp.path().join("out");

    let converter = CartridgeConverter::new(ConversionOptions {
        output_dir: Some(out.clone()),
        ..Default::default()
    });
    let result = converter.convert(&archive).unwrap();

    assert!(out.join(COURSE_JSON).is_file());
    assert!(out.join(OVERVIEW_JSON).is_file());
    assert_eq!(result.overview.counts["context_modules"], 3);
    assert_eq!(result.overview.modules[0].submodules[0].title, "Readings");

    let written = std::fs::read_to_string(out.join(COURSE_JSON)).unwrap();
    let reloaded = CourseIr::from_json(&written).unwrap();
    assert_eq!(reloaded.modules.len(), 3);

    let zip_path = result.course.all_files_zip.clone().expect("all_files.zip");
    let mut zip = zip::ZipArchive::new(std::fs::File::open(zip_path).unwrap()).unwrap();
    let mut image = zip.by_name("media/dana small.png").unwrap();
    let mut bytes = Vec::new();
    image.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_missing_manifest_is_structural_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("empty.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("readme.txt", zip::write::FileOptions::default())
        .unwrap();
    std::io::Write::write_all(&mut zip, b"hi").unwrap();
    zip.finish().unwrap();

    let err = CartridgeConverter::with_defaults().convert(&path).unwrap_err();
    assert!(matches!(err, Error::ManifestError(_)));
}

#[test]
fn test_convert_unpacked_directory() {
    let temp = tempfile::tempdir().unwrap();
    let items = r#"<item identifier="i1" identifierref="r1"><title>Notes</title></item>"#;
    let resources = r#"
    <resource identifier="r1" type="webcontent" href="notes.txt">
      <file href="notes.txt"/>
    </resource>"#;
    std::fs::write(temp.path().join("imsmanifest.xml"), manifest(items, resources)).unwrap();
    std::fs::write(temp.path().join("notes.txt"), "notes").unwrap();

    let course = CartridgeConverter::with_defaults()
        .convert_dir(temp.path())
        .unwrap()
        .course;

    assert_eq!(course.files.len(), 1);
    assert_eq!(course.modules.len(), 1);
    assert_eq!(course.modules[0].migration_id, MISC_MODULE_ID);
}
