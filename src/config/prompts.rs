//! Agent instructions for vidmeta.
//!
//! Instructions can be customized by placing an `agents.toml` file in the
//! custom prompts directory. Any field left out keeps its default.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static VARIABLE_REGEX: OnceLock<Regex> = OnceLock::new();

fn variable_regex() -> &'static Regex {
    VARIABLE_REGEX
        .get_or_init(|| Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("valid variable regex"))
}

/// File name looked up inside the custom prompts directory.
pub const AGENTS_FILE: &str = "agents.toml";

/// Instructions for every agent in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub title_research: String,
    pub title_generator: String,
    pub best_title: String,
    pub description_research: String,
    pub description_generator: String,
    pub aggregator: String,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            title_research: r#"You are an advanced SEO keyword strategist.
Use the web_search tool to identify:
- high-performing keywords,
- search intent,
- trending queries,
- competitor titles,

all related to the user's topic.

Output:
1. A short summary of the search intent + trends.
2. A list of exactly 5 high-volume, SEO-rich keywords or phrases.

Do NOT include anything else."#
                .to_string(),

            title_generator: r#"Context: {title_research}

Task: Create 5 highly clickable, SEO-optimized titles.
Requirements:
- Max 60 characters.
- Must include at least one of the top keywords.
- Prioritize high CTR, clarity, and emotional pull.
- Avoid filler words.

Output: ONLY a numbered list of titles (1-5), with no extra text."#
                .to_string(),

            best_title: r#"Analyze the following title options: {generated_title}

Task: Choose the single best title that maximizes:
- SEO potential,
- Click-through-rate,
- Audience retention likelihood.

Output: Return ONLY the chosen title text.
No explanations, quotes, or added formatting."#
                .to_string(),

            description_research: r#"You are a specialized agent focused on researching by using the web_search tool.
Your task is to find accurate and relevant information for SEO friendly descriptions based on the given topic."#
                .to_string(),

            description_generator: r#"You must generate a YouTube video description by STRICTLY following the structure below.
Do NOT add any explanations, questions, titles, headings, quotes, markdown, or extra text.
Return ONLY the final description content.

STRUCTURE (must be followed exactly in this order):

Part-1:
- Write a short, concise, SEO-friendly description of the video.
- Maximum length: 300 characters.
- Must be based ONLY on {description_research}.

(blank line)

Part-2:
- Leave placeholders ONLY for social media links in the exact format below:
insta: (add link here)
discord: (add link here)

(blank line)

Part-3:
- Write a detailed summary of the video content.
- Length: 600-700 words.
- SEO-friendly, engaging, and relevant to the target audience.
- Use ONLY the information from {description_research}.
- Do NOT invent facts or add external knowledge.

(blank line)

Part-4:
- Leave a placeholder for credits in the exact format below:
Music in this video: (add credits here)

CONSTRAINTS:
- Use ONLY {description_research} as the source of information.
- Do NOT ask questions.
- Do NOT include emojis.
- Do NOT add headings like "Part-1", "Summary", etc.
- Do NOT include any text before or after the description."#
                .to_string(),

            aggregator: r#"Task:
Combine the provided {best_title} and {generated_description} into ONE final output.

ABSOLUTE OUTPUT RULES (NON-NEGOTIABLE):
- Output ONLY the final formatted result.
- Do NOT add explanations, comments, questions, emojis, suggestions, or metadata.
- Do NOT rewrite, rephrase, summarize, expand, compress, or correct the title or description.
- Do NOT add any text before or after the required format.

MANDATORY FORMAT (MUST MATCH EXACTLY):
{best_title}
{generated_description}

The first line MUST be the title. The subsequent lines MUST be the description.

FAILURE CONDITIONS (ANY = INVALID OUTPUT):
- Asking questions
- Adding notes or suggestions
- Altering content in any way
- Outputting anything outside the required format"#
                .to_string(),

            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts from the defaults, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&Path>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = match custom_dir.map(|dir| dir.join(AGENTS_FILE)) {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            _ => Prompts::default(),
        };

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Instruction names in pipeline order.
    pub const NAMES: [&'static str; 6] = [
        "title_research",
        "title_generator",
        "best_title",
        "description_research",
        "description_generator",
        "aggregator",
    ];

    /// Look up an instruction by its field name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let text = match name {
            "title_research" => &self.title_research,
            "title_generator" => &self.title_generator,
            "best_title" => &self.best_title,
            "description_research" => &self.description_research,
            "description_generator" => &self.description_generator,
            "aggregator" => &self.aggregator,
            _ => return None,
        };
        Some(text.as_str())
    }

    /// Write the current instructions into `dir` as an editable overrides file.
    pub fn export_to(&self, dir: &Path) -> crate::error::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(AGENTS_FILE);
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidmetaError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Render `{{variable}}` references with the given variables.
    ///
    /// Substitution is a single pass: values are inserted verbatim and never
    /// rescanned. Unknown names stay as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        variable_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Apply the custom config variables to an instruction.
    ///
    /// Context placeholders (`{key}`) are left for the runner to fill in.
    pub fn instruction(&self, template: &str) -> String {
        Self::render(template, &self.variables)
    }
}
