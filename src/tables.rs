//! Immutable lookup tables injected into the pipeline.
//!
//! Keyword rules, fallback cycles, and default lists are plain data so they
//! can be overridden from JSON without touching the pipeline code. Terms are
//! lowercased and compiled once, when the tables are built or loaded.
use crate::document::{Area, Icon, Material, Tool};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// A keyword or marker matched against lowercased text.
///
/// ASCII terms only match whole words, so `hem` does not fire inside
/// `them`; letters, digits, `-`, `_` and `'` count as word characters. Other
/// terms (CJK has no word separators) match as plain substrings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Term {
    text: String,
    whole_word: Option<Regex>,
}

impl Term {
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let text = raw.trim().to_lowercase();
        let whole_word = if text.is_ascii() && !text.is_empty() {
            Some(Regex::new(&format!(
                r"(?:^|[^a-z0-9_'-]){}(?:[^a-z0-9_'-]|$)",
                regex::escape(&text)
            ))?)
        } else {
            None
        };
        Ok(Self { text, whole_word })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `text` must already be lowercased.
    pub fn is_in(&self, text: &str) -> bool {
        match &self.whole_word {
            Some(pattern) => pattern.is_match(text),
            None => text.contains(self.text.as_str()),
        }
    }
}

impl TryFrom<String> for Term {
    type Error = regex::Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Term::new(&raw)
    }
}

impl From<Term> for String {
    fn from(term: Term) -> Self {
        term.text
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Term {}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)
    }
}

/// Maps any of `keywords` to `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordRule<T> {
    pub value: T,
    pub keywords: Vec<Term>,
}

impl<T: Copy> KeywordRule<T> {
    /// `text` must already be lowercased.
    pub fn matches(&self, text: &str) -> Option<T> {
        self.keywords
            .iter()
            .any(|keyword| keyword.is_in(text))
            .then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineTables {
    /// Used when the model omits the design name.
    pub default_design_name: String,
    /// Used when the model talks about the picture instead of naming the design.
    pub generic_design_name: String,
    pub conversational_markers: Vec<Term>,
    pub default_icon: Icon,
    pub default_area: Area,
    pub default_materials: Vec<Material>,
    pub default_tools: Vec<Tool>,
    /// Checked in order; the first matching rule wins.
    pub icon_rules: Vec<KeywordRule<Icon>>,
    pub area_rules: Vec<KeywordRule<Area>>,
    pub icon_cycle: Vec<Icon>,
    pub area_cycle: Vec<Area>,
}

impl Default for PipelineTables {
    fn default() -> Self {
        Self {
            default_design_name: "未命名设计".to_string(),
            generic_design_name: "立裁设计作品".to_string(),
            conversational_markers: terms(&[
                "图片",
                "照片",
                "这张",
                "上传",
                "您提供",
                "你提供",
                "我看到",
                "可以看到",
                "image",
                "images",
                "photo",
                "photos",
                "picture",
                "pictures",
                "uploaded",
                "i can see",
                "i see",
            ]),
            default_icon: Icon::Pin,
            default_area: Area::Full,
            default_materials: vec![
                material("白坯布", "中厚全棉坯布，布纹清晰", "2-3米"),
                material("标记带", "3-5mm 粘性标记带", "1卷"),
                material("珠针", "立裁专用细珠针", "1盒"),
            ],
            default_tools: vec![
                tool("立裁人台", "固定布料并塑造立体造型"),
                tool("剪刀", "裁剪布料"),
                tool("软尺", "测量人台与布料尺寸"),
                tool("划粉", "在布料上标记线条与对位点"),
                tool("熨斗", "熨平布料和缝份"),
            ],
            icon_rules: vec![
                rule(Icon::Scissors, &["裁剪", "剪开", "剪掉", "剪出", "cut"]),
                rule(Icon::Pencil, &["标记", "画线", "描线", "划粉", "记号", "mark", "chalk"]),
                rule(Icon::Measure, &["测量", "量取", "尺寸", "measure"]),
                rule(Icon::Iron, &["熨", "烫", "press", "iron"]),
                rule(Icon::Fold, &["折叠", "折边", "翻折", "对折", "fold"]),
                rule(Icon::Pleat, &["褶裥", "百褶", "工字褶", "pleat"]),
                rule(Icon::Baste, &["假缝", "疏缝", "粗缝", "baste"]),
                rule(Icon::Dart, &["收省", "省道", "省尖", "dart"]),
                rule(Icon::Gather, &["抽褶", "碎褶", "抽缩", "gather"]),
                rule(Icon::Drape, &["垂坠", "悬垂", "披挂", "drape"]),
                rule(Icon::Wrap, &["包裹", "缠绕", "环绕", "wrap"]),
                rule(Icon::Trim, &["修剪", "修整", "trim"]),
                rule(Icon::Hand, &["抚平", "捋顺", "推平", "smooth"]),
                rule(Icon::Pin, &["大头针", "珠针", "别针", "固定", "pin"]),
                rule(Icon::Tuck, &["塞入", "掖", "内收", "tuck"]),
            ],
            area_rules: vec![
                rule(Area::Neck, &["领口", "领子", "领围", "衣领", "颈", "neck", "collar"]),
                rule(Area::Shoulder, &["肩", "shoulder"]),
                rule(Area::Chest, &["胸", "bust", "chest"]),
                rule(Area::Waist, &["腰", "waist"]),
                rule(Area::Hip, &["臀", "hip"]),
                rule(Area::Hem, &["下摆", "裙摆", "底边", "hem"]),
                rule(Area::Side, &["侧缝", "侧面", "side"]),
                rule(Area::Back, &["后片", "后背", "背部", "back"]),
            ],
            icon_cycle: vec![
                Icon::Pin,
                Icon::Hand,
                Icon::Scissors,
                Icon::Pencil,
                Icon::Fold,
                Icon::Iron,
                Icon::Measure,
                Icon::Ruler,
            ],
            area_cycle: vec![
                Area::Full,
                Area::Chest,
                Area::Waist,
                Area::Shoulder,
                Area::Neck,
                Area::Hip,
                Area::Side,
                Area::Hem,
                Area::Back,
            ],
        }
    }
}

/// Render the built-in tables as pretty JSON, the starting point for overrides.
pub fn tables_stub() -> Result<String> {
    serde_json::to_string_pretty(&PipelineTables::default()).context("serialize default tables")
}

/// Load table overrides from a JSON file.
pub fn load_tables(path: &Path) -> Result<PipelineTables> {
    let bytes = fs::read(path).with_context(|| format!("read tables {}", path.display()))?;
    let tables: PipelineTables =
        serde_json::from_slice(&bytes).context("parse pipeline tables JSON")?;
    validate_tables(&tables)?;
    Ok(tables)
}

/// Reject tables that would break the pipeline's guarantees.
pub fn validate_tables(tables: &PipelineTables) -> Result<()> {
    if tables.default_design_name.trim().is_empty() {
        return Err(anyhow!("default_design_name must be non-empty"));
    }
    if tables.generic_design_name.trim().is_empty() {
        return Err(anyhow!("generic_design_name must be non-empty"));
    }
    if tables.default_materials.is_empty() {
        return Err(anyhow!("default_materials must list at least one material"));
    }
    if tables.default_tools.is_empty() {
        return Err(anyhow!("default_tools must list at least one tool"));
    }
    check_cycle("icon_cycle", &tables.icon_cycle)?;
    check_cycle("area_cycle", &tables.area_cycle)?;
    let empty_keyword = tables
        .icon_rules
        .iter()
        .flat_map(|rule| rule.keywords.iter())
        .chain(tables.area_rules.iter().flat_map(|rule| rule.keywords.iter()))
        .chain(tables.conversational_markers.iter())
        .any(|keyword| keyword.as_str().is_empty());
    if empty_keyword {
        return Err(anyhow!("keywords and conversational markers must be non-empty"));
    }
    Ok(())
}

/// Four or more collapsed steps with no keyword hits are spread over the
/// first cycle positions, so the first two must differ.
fn check_cycle<T: Ord>(name: &str, cycle: &[T]) -> Result<()> {
    if cycle.iter().collect::<BTreeSet<_>>().len() < 2 {
        return Err(anyhow!("{name} needs at least two distinct values"));
    }
    if cycle[0] == cycle[1] {
        return Err(anyhow!("{name} must start with two different values"));
    }
    Ok(())
}

fn terms(values: &[&str]) -> Vec<Term> {
    values
        .iter()
        .map(|value| Term::new(value).expect("escaped built-in term compiles"))
        .collect()
}

fn rule<T>(value: T, keywords: &[&str]) -> KeywordRule<T> {
    KeywordRule {
        value,
        keywords: terms(keywords),
    }
}

fn material(item: &str, spec: &str, qty: &str) -> Material {
    Material {
        item: item.to_string(),
        spec: spec.to_string(),
        qty: qty.to_string(),
    }
}

fn tool(name: &str, purpose: &str) -> Tool {
    Tool {
        name: name.to_string(),
        purpose: purpose.to_string(),
    }
}
