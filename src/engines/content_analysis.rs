// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::models::diagnostic::{
    ContentAnalysis, ElementCount, HtmlAnalysis, JsonAnalysis, TextAnalysis, XmlAnalysis,
};
use crate::engines::fingerprint;
use crate::utils::text_encoding::decode_body;

/// 内容分析输出
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub analysis: ContentAnalysis,
    /// 正文中识别出的技术（仅HTML）
    pub technologies: BTreeSet<String>,
}

/// MIME族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeFamily {
    Html,
    Json,
    Xml,
    Text,
    Unknown,
}

impl MimeFamily {
    /// 按声明的内容类型归类
    ///
    /// XML先于通用文本判断，`text/xml` 归入XML
    pub fn classify(content_type: &str) -> Self {
        let mime = essence(content_type);
        if mime == "text/html" || mime == "application/xhtml+xml" {
            MimeFamily::Html
        } else if mime == "application/json" || mime.ends_with("+json") {
            MimeFamily::Json
        } else if mime == "application/xml" || mime == "text/xml" || mime.ends_with("+xml") {
            MimeFamily::Xml
        } else if mime.starts_with("text/") {
            MimeFamily::Text
        } else {
            MimeFamily::Unknown
        }
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// 分析响应体
///
/// 纯函数：相同的输入总是得到相同的输出。
/// 分析过程中的任何错误都落入 `ContentAnalysis::Failed`，不会向外传播。
///
/// # 参数
///
/// * `body` - 原始响应体
/// * `content_type` - 声明的内容类型
pub fn analyze(body: &[u8], content_type: &str) -> AnalysisOutcome {
    let mut technologies = BTreeSet::new();

    let analysis = match MimeFamily::classify(content_type) {
        MimeFamily::Html => {
            let text = decode_body(body, content_type);
            technologies = fingerprint::content_technologies(&text);
            match analyze_html(&text) {
                Ok(html) => ContentAnalysis::Html(html),
                Err(error) => ContentAnalysis::Failed { error },
            }
        }
        MimeFamily::Json => ContentAnalysis::Json(analyze_json(body, content_type)),
        MimeFamily::Xml => ContentAnalysis::Xml(analyze_xml(&decode_body(body, content_type))),
        MimeFamily::Text => ContentAnalysis::Text(analyze_text(&decode_body(body, content_type))),
        MimeFamily::Unknown => ContentAnalysis::Unknown {
            mime: essence(content_type),
        },
    };

    AnalysisOutcome {
        analysis,
        technologies,
    }
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector {}: {}", css, e))
}

fn analyze_html(text: &str) -> Result<HtmlAnalysis, String> {
    let document = Html::parse_document(text);

    let title = document
        .select(&selector("title")?)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string());

    let mut meta_tags = BTreeMap::new();
    for meta in document.select(&selector("meta")?) {
        let attrs = meta.value();
        let name = attrs
            .attr("name")
            .or_else(|| attrs.attr("property"))
            .or_else(|| attrs.attr("http-equiv"));
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            meta_tags.insert(name.to_lowercase(), attrs.attr("content").map(str::to_string));
        }
    }

    let count = |css: &str| -> Result<usize, String> { Ok(document.select(&selector(css)?).count()) };
    let element_count = ElementCount {
        links: count("a")?,
        images: count("img")?,
        scripts: count("script")?,
        stylesheets: count("link[rel~=\"stylesheet\"]")?,
        forms: count("form")?,
    };

    Ok(HtmlAnalysis {
        title,
        meta_tags,
        element_count,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn analyze_json(body: &[u8], content_type: &str) -> JsonAnalysis {
    let text = decode_body(body, content_type);
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => {
            let size = serde_json::to_string(&map).map(|s| s.len()).ok();
            JsonAnalysis {
                json_valid: true,
                json_keys: Some(map.keys().cloned().collect()),
                json_type: None,
                json_size: size,
            }
        }
        Ok(other) => JsonAnalysis {
            json_valid: true,
            json_keys: None,
            json_type: Some(json_type_name(&other).to_string()),
            json_size: Some(body.len()),
        },
        Err(_) => JsonAnalysis {
            json_valid: false,
            json_keys: None,
            json_type: None,
            json_size: None,
        },
    }
}

fn analyze_text(text: &str) -> TextAnalysis {
    TextAnalysis {
        line_count: text.split('\n').count(),
        word_count: text.split_whitespace().count(),
        character_count: text.chars().count(),
    }
}

fn analyze_xml(text: &str) -> XmlAnalysis {
    XmlAnalysis {
        xml_size: text.chars().count(),
        has_xml_declaration: text.starts_with("<?xml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_title_and_counts() {
        let outcome = analyze(b"<html><title>Hi</title></html>", "text/html");
        match outcome.analysis {
            ContentAnalysis::Html(html) => {
                assert_eq!(html.title.as_deref(), Some("Hi"));
                assert_eq!(html.element_count.links, 0);
            }
            other => panic!("unexpected analysis: {:?}", other),
        }
    }

    #[test]
    fn test_html_meta_and_elements() {
        let body = br#"<html><head>
            <meta name="Description" content="demo">
            <meta property="og:title" content="Demo">
            <meta http-equiv="refresh" content="30">
            <link rel="stylesheet" href="a.css"><link rel="icon" href="f.ico">
            <script src="/wp-includes/x.js"></script>
        </head><body>
            <a href="/1">1</a><a href="/2">2</a><img src="x.png"><form></form>
        </body></html>"#;
        let outcome = analyze(body, "text/html; charset=utf-8");

        let ContentAnalysis::Html(html) = outcome.analysis else {
            panic!("expected html analysis");
        };
        assert_eq!(html.meta_tags.get("description"), Some(&Some("demo".to_string())));
        assert!(html.meta_tags.contains_key("og:title"));
        assert!(html.meta_tags.contains_key("refresh"));
        assert_eq!(
            html.element_count,
            ElementCount {
                links: 2,
                images: 1,
                scripts: 1,
                stylesheets: 1,
                forms: 1,
            }
        );
        assert!(outcome.technologies.contains("wordpress"));
    }

    #[test]
    fn test_json_object_and_scalar() {
        let ContentAnalysis::Json(object) = analyze(br#"{"a":1,"b":[2]}"#, "application/json").analysis
        else {
            panic!("expected json analysis");
        };
        assert!(object.json_valid);
        assert_eq!(object.json_keys, Some(vec!["a".to_string(), "b".to_string()]));

        let ContentAnalysis::Json(array) = analyze(b"[1, 2, 3]", "application/json").analysis else {
            panic!("expected json analysis");
        };
        assert_eq!(array.json_type.as_deref(), Some("array"));
        assert_eq!(array.json_size, Some(9));

        let ContentAnalysis::Json(invalid) = analyze(b"{oops", "application/json").analysis else {
            panic!("expected json analysis");
        };
        assert!(!invalid.json_valid);
    }

    #[test]
    fn test_text_and_xml() {
        assert_eq!(
            analyze(b"hello world\nsecond", "text/plain").analysis,
            ContentAnalysis::Text(TextAnalysis {
                line_count: 2,
                word_count: 3,
                character_count: 18,
            })
        );
        assert_eq!(
            analyze(b"<?xml version=\"1.0\"?><a/>", "text/xml").analysis,
            ContentAnalysis::Xml(XmlAnalysis {
                xml_size: 25,
                has_xml_declaration: true,
            })
        );
    }

    #[test]
    fn test_unknown_mime() {
        assert_eq!(
            analyze(&[0, 1, 2], "image/png").analysis,
            ContentAnalysis::Unknown {
                mime: "image/png".to_string()
            }
        );
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let cases: &[(&[u8], &str)] = &[
            (b"<html><title>T</title><a href='#'>x</a><script>React</script></html>", "text/html"),
            (br#"{"k": [1, 2], "z": null}"#, "application/json"),
            (b"one two\nthree", "text/plain"),
            (b"<root/>", "application/xml"),
        ];
        for (body, content_type) in cases {
            assert_eq!(analyze(body, content_type), analyze(body, content_type));
        }
    }
}
