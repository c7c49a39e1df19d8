//! Image source normalization.
//!
//! The catalog's image links come from several scrapes and spreadsheet
//! revisions: protocol-relative links, Wikimedia thumbnails, `File:` pages,
//! `Special:FilePath` links and WikiAves covers. Everything Wikimedia is
//! rewritten to a single `Special:Redirect` form at a fixed width.

use regex::Regex;
use std::sync::LazyLock;

const REDIRECT_PREFIX: &str =
    "https://commons.wikimedia.org/w/index.php?title=Special:Redirect/file/";
const REDIRECT_WIDTH: &str = "width=500";

static DUPLICATE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^/]+\.(?:jpg|png|jpeg|gif|svg))/([^/]+\.(?:jpg|png|jpeg|gif|svg))$")
        .expect("duplicate filename pattern is valid")
});

static IMAGE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?:jpg|png|jpeg|gif|svg)$").expect("image file pattern is valid")
});

static PIXEL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+px-").expect("pixel prefix pattern is valid"));

/// Covers for birds whose Wikimedia images never resolved.
const WIKIAVES_COVERS: &[(&str, &str)] = &[
    ("Saí-verde", "https://www.wikiaves.com.br/img/fotocapa/_114177.jpg"),
    ("Saí-azul", "https://www.wikiaves.com.br/img/fotocapa/_66254.jpg"),
    ("Saíra-sete-cores", "https://www.wikiaves.com.br/img/fotocapa/_97262.jpg"),
    ("Capitão-de-saíra", "https://www.wikiaves.com.br/img/fotocapa/_92456.jpg"),
    ("Saíra-militar", "https://www.wikiaves.com.br/img/fotocapa/_105249.jpg"),
    ("Sanhaço-do-coqueiro", "https://www.wikiaves.com.br/img/fotocapa/_234168.jpg"),
    ("Tiê-preto", "https://www.wikiaves.com.br/img/fotocapa/_93389.jpg"),
    ("Sanhaço-cinzento", "https://www.wikiaves.com.br/img/fotocapa/_66158.jpg"),
    ("Alma-de-gato", "https://www.wikiaves.com.br/img/fotocapa/_112310.jpg"),
    ("Tico-tico", "https://www.wikiaves.com.br/img/fotocapa/_190063.jpg"),
    ("Sabiá-poca", "https://www.wikiaves.com.br/img/fotocapa/_66118.jpg"),
    ("Sabiá-una", "https://www.wikiaves.com.br/img/fotocapa/_111834.jpg"),
    ("Periquito-rico", "https://www.wikiaves.com.br/img/fotocapa/_115003.jpg"),
    ("Sanhaço-de-encontro-azul", "https://www.wikiaves.com.br/img/fotocapa/_93341.jpg"),
    ("Sanhaço-de-encontro-amarelo", "https://www.wikiaves.com.br/img/fotocapa/_66187.jpg"),
    ("Tiê-de-topete", "https://www.wikiaves.com.br/img/fotocapa/_93379.jpg"),
    ("Surucuá-de-barriga-amarela", "https://www.wikiaves.com.br/img/fotocapa/_66149.jpg"),
    ("Gaturamo-rei", "https://www.wikiaves.com.br/img/fotocapa/_93316.jpg"),
    ("Tangará", "https://www.wikiaves.com.br/img/fotocapa/_93450.jpg"),
    ("Viuvinha", "https://www.wikiaves.com.br/img/fotocapa/_119772.jpg"),
    ("Tiê-de-bando", "https://www.wikiaves.com.br/img/fotocapa/_93373.jpg"),
    ("Ferro-velho", "https://www.wikiaves.com.br/img/fotocapa/_66261.jpg"),
    ("Bico-de-lacre", "https://www.wikiaves.com.br/img/fotocapa/_93409.jpg"),
    ("Catirumbava", "https://www.wikiaves.com.br/img/fotocapa/_97213.jpg"),
    ("Tiê-sangue", "https://www.wikiaves.com.br/img/fotocapa/_66209.jpg"),
];

pub fn normalize_image_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.contains("wikiaves.com.br") {
        return url.to_string();
    }

    let mut url = match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    };

    // e.g. .../f/f8/Dacnis_cayana.jpg/Dacnis_cayana.jpg
    let duplicated = DUPLICATE_FILENAME
        .captures(&url)
        .is_some_and(|caps| caps[1] == caps[2]);
    if duplicated {
        if let Some(cut) = url.rfind('/') {
            url.truncate(cut);
        }
    }

    if url.contains("Special:Redirect/file/") {
        if let Some((head, _)) = url.split_once("width=") {
            return format!("{head}{REDIRECT_WIDTH}");
        }
        return url;
    }

    if url.contains("Special:FilePath") {
        let filename = url.rsplit('/').next().unwrap_or_default();
        return redirect_url(&decode_component(filename));
    }

    if url.contains("upload.wikimedia.org") {
        let filename = url
            .rsplit('/')
            .find(|part| !part.is_empty() && IMAGE_FILE.is_match(part))
            .map(str::to_string);
        return match filename {
            Some(filename) => redirect_url(&filename),
            None => url,
        };
    }

    if url.contains("commons.wikimedia.org/wiki/File:") {
        if let Some((_, rest)) = url.split_once("File:") {
            let filename = rest.split(['#', '?']).next().unwrap_or_default();
            return redirect_url(filename);
        }
    }

    if ["/280px-", "/330px-", "/250px-"]
        .iter()
        .any(|prefix| url.contains(prefix))
    {
        if let Some(part) = url.split('/').find(|part| part.contains("px-")) {
            return redirect_url(&PIXEL_PREFIX.replace(part, ""));
        }
    }

    if let Some(last) = url.rsplit('/').next() {
        if IMAGE_FILE.is_match(last) {
            return redirect_url(last);
        }
    }

    let lowered = url.to_lowercase();
    WIKIAVES_COVERS
        .iter()
        .find(|(name, _)| lowered.contains(&name.to_lowercase()))
        .map(|(_, cover)| cover.to_string())
        .unwrap_or(url)
}

fn redirect_url(filename: &str) -> String {
    format!(
        "{REDIRECT_PREFIX}{}&{REDIRECT_WIDTH}",
        encode_component(filename)
    )
}

/// Percent-encodes everything outside the URI component unreserved set.
fn encode_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Decodes `%XX` escapes; malformed escapes are kept literally.
fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1..i + 3].iter().all(u8::is_ascii_hexdigit)
        {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                decoded.push(value);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
