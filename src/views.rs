//! HTML views.
//!
//! Every string that did not originate in this file (label descriptions,
//! MIME types, error messages) goes through [`escape_html`] before it is
//! placed in markup.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use crate::error::AppError;
use crate::upload::UploadedImage;
use crate::vision::LabelResult;

/// JSON body for a failed upload.
#[derive(Debug, Serialize)]
pub struct UploadFailure {
    pub success: bool,
    pub message: String,
}

/// JSON body for a successful upload, consumed by `public/js/upload.js`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSuccess {
    pub success: bool,
    pub image_src: String,
    pub labels: Vec<String>,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Score as a percentage with exactly two decimals, e.g. `0.956` -> `95.60`.
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score * 100.0)
}

/// One result line as plain text: `<description> -> <percent>%`.
pub fn label_text(label: &LabelResult) -> String {
    format!("{} -> {}%", label.description, format_score(label.score))
}

/// Same as [`label_text`] with the description escaped for markup.
pub fn label_line(label: &LabelResult) -> String {
    format!(
        "{} -> {}%",
        escape_html(&label.description),
        format_score(label.score)
    )
}

pub fn data_uri(image: &UploadedImage) -> String {
    format!(
        "data:{};base64,{}",
        image.mime_type,
        general_purpose::STANDARD.encode(&image.bytes)
    )
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

pub fn results(image: &UploadedImage, labels: &[LabelResult]) -> Html<String> {
    let lines = labels.iter().map(label_line).collect::<Vec<_>>().join("\n");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Label Detection Results</title>
    <style>{RESULTS_STYLE}</style>
</head>
<body>
    <div class="results">
        <h1>Detected Labels</h1>
        <img src="{src}" alt="Uploaded Image">
        <pre class="labels">
{lines}
</pre>
        <a href="/">Upload Next Image</a>
    </div>
</body>
</html>
"#,
        src = escape_html(&data_uri(image)),
    ))
}

pub fn results_json(image: &UploadedImage, labels: &[LabelResult]) -> Json<UploadSuccess> {
    Json(UploadSuccess {
        success: true,
        image_src: data_uri(image),
        labels: labels.iter().map(label_text).collect(),
    })
}

/// `{success: false, message}` with the error's status.
pub fn failure_json(err: &AppError) -> Response {
    (
        err.status(),
        Json(UploadFailure {
            success: false,
            message: err.to_string(),
        }),
    )
        .into_response()
}

pub fn no_file_page() -> Response {
    let message = AppError::NoFileProvided.to_string();
    (
        StatusCode::BAD_REQUEST,
        Html(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>No File</title></head>
<body>
    <h1>{message}</h1>
    <a href="/">Back to upload</a>
</body>
</html>
"#
        )),
    )
        .into_response()
}

pub fn error_fragment(message: &str) -> Html<String> {
    Html(format!("<h1>Error</h1><p>{}</p>", escape_html(message)))
}

const RESULTS_STYLE: &str = r#"
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: rgb(202, 167, 183);
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            text-align: center;
        }

        .results {
            background: #fff;
            padding: 40px;
            border-radius: 16px;
            box-shadow: 0 10px 30px rgba(0,0,0,0.15);
            max-width: 600px;
            width: 90%;
        }

        img {
            max-width: 100%;
            border-radius: 12px;
            margin-bottom: 24px;
        }

        .labels {
            font-family: monospace;
            text-align: left;
            line-height: 1.8;
        }

        a {
            display: inline-block;
            margin-top: 24px;
            text-decoration: none;
            background-color: #ff6f91;
            color: white;
            padding: 12px 24px;
            border-radius: 8px;
            font-weight: 600;
        }
"#;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Image Label Detection</title>
    <style>
        * {
            box-sizing: border-box;
        }

        body {
            margin: 0;
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background: rgb(202, 167, 183);
            min-height: 100vh;
            display: flex;
            justify-content: center;
            align-items: center;
            color: #333;
        }

        .container {
            background-color: #FFB6C1;
            padding: 40px;
            border-radius: 12px;
            box-shadow: 0 8px 24px rgba(0,0,0,0.2);
            text-align: center;
            width: 100%;
            max-width: 500px;
        }

        form {
            display: flex;
            flex-direction: column;
            align-items: center;
        }

        input[type="file"] {
            margin-bottom: 20px;
            padding: 10px;
            border: 1px solid #ccc;
            border-radius: 6px;
            width: 100%;
        }

        input[type="submit"] {
            background-color: rgb(95, 181, 136);
            border: none;
            color: white;
            padding: 12px 24px;
            font-size: 16px;
            border-radius: 6px;
            cursor: pointer;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>Please Upload an Image to Process</h1>
        <form id="uploadForm" action="/uploadImage" method="POST" enctype="multipart/form-data">
            <input type="file" name="file" accept="image/*" required>
            <input type="submit" value="Click to Process">
        </form>
    </div>
    <script src="/js/upload.js"></script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn image(bytes: &[u8], mime: &str) -> UploadedImage {
        UploadedImage {
            bytes: bytes.to_vec().into(),
            mime_type: mime.to_string(),
            size_bytes: bytes.len(),
        }
    }

    #[test]
    fn test_format_score_two_decimals() {
        assert_eq!(format_score(0.956), "95.60");
        assert_eq!(format_score(0.8), "80.00");
        assert_eq!(format_score(0.42), "42.00");
        assert_eq!(format_score(1.0), "100.00");
        assert_eq!(format_score(0.0), "0.00");
        // Single precision would round this one down to 98.76.
        assert_eq!(format_score(0.98765), "98.77");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape_html("Golden retriever"), "Golden retriever");
    }

    #[test]
    fn test_results_renders_one_line_per_label_in_order() {
        let labels = vec![
            LabelResult {
                description: "Dog".into(),
                score: 0.97,
            },
            LabelResult {
                description: "Carnivore".into(),
                score: 0.5,
            },
        ];
        let Html(page) = results(&image(b"abc", "image/png"), &labels);

        let dog = page.find("Dog -> 97.00%").expect("dog line");
        let carnivore = page.find("Carnivore -> 50.00%").expect("carnivore line");
        assert!(dog < carnivore);
        assert!(page.contains(r#"<img src="data:image/png;base64,YWJj""#));
    }

    #[test]
    fn test_results_with_no_labels_has_empty_block() {
        let Html(page) = results(&image(b"abc", "image/gif"), &[]);
        assert!(page.contains("<pre class=\"labels\">\n\n</pre>"));
        assert!(!page.contains(" -> "));
    }

    #[test]
    fn test_description_markup_is_escaped() {
        let labels = vec![LabelResult {
            description: "<b>bold</b>".into(),
            score: 0.1,
        }];
        let Html(page) = results(&image(b"x", "image/png"), &labels);
        assert!(page.contains("&lt;b&gt;bold&lt;/b&gt; -> 10.00%"));
        assert!(!page.contains("<b>bold</b>"));
    }

    #[test]
    fn test_mime_type_cannot_break_out_of_attribute() {
        let Html(page) = results(&image(b"x", "image/png\" onerror=\"alert(1)"), &[]);
        assert!(!page.contains("onerror=\"alert"));
    }

    #[test]
    fn test_error_fragment_escapes_message() {
        let Html(body) = error_fragment("bad <input>");
        assert_eq!(body, "<h1>Error</h1><p>bad &lt;input&gt;</p>");
    }
}
