//! Prompt template for test-case generation.
//!
//! The template is Turkish and fixed. Placeholders are substituted verbatim;
//! nothing the caller sends is escaped.

use crate::catalog::ResolvedFramework;

const PROMPT_TEMPLATE: &str = r#"
Sen uzman bir QA Otomasyon Mühendisisin.
GÖREV: Aşağıdaki gereksinim için **{fw_name}** kütüphanesini kullanarak test otomasyon kodu yaz.

KURALLAR:
1. Yanıtın SADECE geçerli bir JSON objesi olmalıdır.
2. "test_case" içeriği (title, steps, expected) TAMAMEN TÜRKÇE olmalıdır.
3. "script_code" alanı BOŞ KALAMAZ.
4. **ÖNEMLİ:** Aşağıdaki örneği kopyalama! Sadece formatı örnek al, kodu verilen gereksinime ({req}) göre sıfırdan yaz.

ÖRNEK GİRDİ (Formatı anlaman için):
Gereksinim: Google'a git ve arama yap.
Çıktı Formatı:
{{
  "test_case": {{
    "title": "Google Arama Testi",
    "steps": ["Google anasayfasına git", "...", "..."],
    "expected": "..."
  }},
  "script_code": "{example_code}", 
  "script": "{fw_slug}"
}}

---------------------------------------------------
ŞİMDİ GERÇEK SENARYOYU YAZ:

Gereksinim: {req}
Framework: {fw_name}
"#;

/// Title case of one character.
///
/// Unicode titlecase equals the uppercase mapping with the tail lower-cased,
/// except for the digraphs, Greek letters with ypogegrammeni, Georgian
/// Mkhedruli and U+0149, which are listed here.
fn title_case(c: char) -> String {
    match c {
        '\u{0149}' => "\u{02BC}N".to_string(),
        '\u{01C4}'..='\u{01C6}' => '\u{01C5}'.to_string(),
        '\u{01C7}'..='\u{01C9}' => '\u{01C8}'.to_string(),
        '\u{01CA}'..='\u{01CC}' => '\u{01CB}'.to_string(),
        '\u{01F1}'..='\u{01F3}' => '\u{01F2}'.to_string(),
        '\u{10D0}'..='\u{10FA}' | '\u{10FD}'..='\u{10FF}' => c.to_string(),
        '\u{1F80}'..='\u{1FAF}' => {
            let cp = c as u32;
            let titled = if cp & 0x8 == 0 { cp + 8 } else { cp };
            char::from_u32(titled).unwrap_or(c).to_string()
        }
        '\u{1FB3}' | '\u{1FBC}' => '\u{1FBC}'.to_string(),
        '\u{1FC3}' | '\u{1FCC}' => '\u{1FCC}'.to_string(),
        '\u{1FF3}' | '\u{1FFC}' => '\u{1FFC}'.to_string(),
        '\u{1FB2}' => "\u{1FBA}\u{0345}".to_string(),
        '\u{1FB4}' => "\u{0386}\u{0345}".to_string(),
        '\u{1FB7}' => "\u{0391}\u{0342}\u{0345}".to_string(),
        '\u{1FC2}' => "\u{1FCA}\u{0345}".to_string(),
        '\u{1FC4}' => "\u{0389}\u{0345}".to_string(),
        '\u{1FC7}' => "\u{0397}\u{0342}\u{0345}".to_string(),
        '\u{1FF2}' => "\u{1FFA}\u{0345}".to_string(),
        '\u{1FF4}' => "\u{038F}\u{0345}".to_string(),
        '\u{1FF7}' => "\u{03A9}\u{0342}\u{0345}".to_string(),
        _ => {
            let mut upper = c.to_uppercase();
            let mut out: String = upper.next().into_iter().collect();
            out.extend(upper.flat_map(char::to_lowercase));
            out
        }
    }
}

/// Title-case the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => title_case(first) + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Fill the template for one request.
///
/// Substitution is a single left-to-right pass, so placeholder-looking text
/// inside the requirement or example code is left alone.
pub fn render_prompt(framework: &ResolvedFramework, requirement: &str) -> String {
    let fw_name = capitalize(&framework.slug);
    let mut out = String::with_capacity(PROMPT_TEMPLATE.len() + requirement.len() * 2);
    let mut rest = PROMPT_TEMPLATE;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if let Some(end) = tail.find('}')
            && tail.starts_with('{')
        {
            match &tail[1..end] {
                "fw_name" => out.push_str(&fw_name),
                "fw_slug" => out.push_str(&framework.slug),
                "example_code" => out.push_str(framework.example.code),
                "req" => out.push_str(requirement),
                other => {
                    out.push('{');
                    out.push_str(other);
                    out.push('}');
                }
            }
            rest = &tail[end + 1..];
        } else {
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
