#[cfg(test)]
mod passing {
    use htmldocx::core::format_output_path;

    #[test]
    fn as_is() {
        let final_destination = format_output_path("/home/username/Documents/report.docx", Some(""));

        assert_eq!(final_destination, "/home/username/Documents/report.docx");
    }

    #[test]
    fn substitute_title() {
        let final_destination =
            format_output_path("/home/username/Documents/%title%.docx", Some("Document Title"));

        assert_eq!(final_destination, "/home/username/Documents/Document Title.docx");
    }

    #[test]
    fn substitute_extension() {
        let final_destination = format_output_path("exports/%title%.%extension%", Some("Notes"));

        assert_eq!(final_destination, "exports/Notes.docx");
    }

    #[test]
    fn sanitize_title() {
        let final_destination = format_output_path(
            "%title%.docx",
            Some(".hidden/<draft>: \"v2\" | final?"),
        );

        assert_eq!(final_destination, "hidden_[draft] -  v2 - final.docx");
    }

    #[test]
    fn missing_title_is_empty() {
        let final_destination = format_output_path("out/%title%.docx", None);

        assert_eq!(final_destination, "out/.docx");
    }

    #[test]
    fn substitute_timestamp() {
        let final_destination = format_output_path("%timestamp%.docx", None);

        assert!(final_destination.ends_with("Z.docx"));
        assert!(!final_destination.contains(':'));
    }
}
