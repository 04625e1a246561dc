//! Model alias and framework example tables.
//!
//! Both tables are process-wide constants. Lookups never fail: an unknown
//! model hint resolves to [`DEFAULT_MODEL`] and an unknown framework borrows
//! the Playwright example.

/// Canonical model used when no alias matches the hint
pub const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";

/// Hint used for alias matching when the caller supplies no model
pub const DEFAULT_MODEL_HINT: &str = "default";

/// Framework slug used when the request omits one
pub const DEFAULT_FRAMEWORK: &str = "playwright";

/// Short alias -> canonical model identifier, in match priority order
pub static MODEL_ALIASES: &[(&str, &str)] = &[
    ("qwen", "qwen2.5-coder:7b"),
    ("deepseek", "deepseek-coder:6.7b"),
    ("llama", "llama3.1:8b"),
];

/// Style reference for one automation framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkExample {
    pub slug: &'static str,
    pub code: &'static str,
    pub description: &'static str,
}

pub static FRAMEWORK_EXAMPLES: &[FrameworkExample] = &[
    FrameworkExample {
        slug: "playwright",
        code: "await page.goto('https://google.com'); await page.fill('input[name=q]', 'test'); await page.press('input[name=q]', 'Enter');",
        description: "Playwright (Async/Python)",
    },
    FrameworkExample {
        slug: "selenium",
        code: "driver.get('https://google.com'); driver.find_element(By.NAME, 'q').send_keys('test', Keys.RETURN);",
        description: "Selenium (Python)",
    },
    FrameworkExample {
        slug: "cypress",
        code: "cy.visit('https://google.com'); cy.get('input[name=q]').type('test{enter}');",
        description: "Cypress (JS)",
    },
];

/// Framework after case folding, paired with the example used for the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFramework {
    /// Lower-cased slug as supplied by the caller, echoed back even on fallback
    pub slug: String,
    pub example: &'static FrameworkExample,
}

impl ResolvedFramework {
    /// True when the slug had no entry and the Playwright example was borrowed
    pub fn is_fallback(&self) -> bool {
        self.example.slug != self.slug
    }
}

/// Resolve a model hint to a canonical identifier.
///
/// The first alias (in table order) contained anywhere in the lower-cased
/// hint wins, so `"qwen-llama"` resolves to the qwen model.
pub fn resolve_model(hint: Option<&str>) -> &'static str {
    let key = hint
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_MODEL_HINT.to_string());
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| key.contains(alias))
        .map(|(_, model)| *model)
        .unwrap_or(DEFAULT_MODEL)
}

/// Look up a framework example by exact slug
pub fn framework_example(slug: &str) -> Option<&'static FrameworkExample> {
    FRAMEWORK_EXAMPLES.iter().find(|ex| ex.slug == slug)
}

pub fn resolve_framework(framework: &str) -> ResolvedFramework {
    let slug = framework.to_lowercase();
    let example = framework_example(&slug).unwrap_or(&FRAMEWORK_EXAMPLES[0]);
    ResolvedFramework { slug, example }
}
