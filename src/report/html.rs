//! Small HTML builders for the sample report.

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn html_start() -> String {
    concat!(
        "<!DOCTYPE html>\n",
        "<html>\n",
        "<head>\n",
        "<meta charset=\"utf-8\">\n",
        "<title>TTS samples</title>\n",
        "<style>\n",
        "body { font-family: sans-serif; margin: 2em; }\n",
        ".sample { margin-bottom: 1.5em; }\n",
        ".text { font-size: 1.4em; }\n",
        ".phonemes { font-family: monospace; color: #555; }\n",
        "</style>\n",
        "</head>\n",
        "<body>\n",
    )
    .to_string()
}

pub fn html_end() -> String {
    "</body>\n</html>\n".to_string()
}

/// `<hN>` heading; `n` is clamped to 1..=6.
pub fn heading(text: &str, n: u8) -> String {
    let n = n.clamp(1, 6);
    format!("<h{n}>{}</h{n}>\n", escape(text))
}

/// Audio player followed by the source text and its phonemes.
pub fn sample_entry(audio_src: &str, text: &str, phonemes: &str) -> String {
    format!(
        concat!(
            "<div class=\"sample\">\n",
            "<audio controls src=\"{src}\"></audio>\n",
            "<p class=\"text\" dir=\"rtl\" lang=\"ar\">{text}</p>\n",
            "<p class=\"phonemes\">{phonemes}</p>\n",
            "</div>\n",
        ),
        src = escape(audio_src),
        text = escape(text),
        phonemes = escape(phonemes),
    )
}

pub fn img(src: &str) -> String {
    format!("<img src=\"{}\">\n", escape(src))
}

/// Script setting the volume of every audio element on the page.
pub fn volume_script(volume: f32) -> String {
    let volume = volume.clamp(0.0, 1.0);
    format!(
        "<script>\ndocument.querySelectorAll('audio').forEach(a => {{ a.volume = {volume}; }});\n</script>\n"
    )
}
