use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// 标题缺失或为空时的占位文本
pub const UNTITLED: &str = "Untitled";

/// 文章元信息（每个请求构造一次，响应后丢弃）
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub date: DateTime<Utc>,
    pub title: String,
    /// 阅读时长（分钟，非负有限值）
    pub reading_time_minutes: f64,
}

/// 原始查询参数（同名参数取第一次出现的值）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OgQuery {
    pub title: Option<String>,
    pub date: Option<String>,
    pub reading_time: Option<String>,
    pub format: Option<String>,
}

impl OgQuery {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut q = OgQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "title" => &mut q.title,
                "date" => &mut q.date,
                "readingTime" => &mut q.reading_time,
                "format" => &mut q.format,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        q
    }
}

impl PostMeta {
    /// 从查询参数构造；任何输入都会得到一个合法值，此阶段不会失败。
    pub fn from_query(q: &OgQuery) -> Self {
        Self {
            date: parse_date(q.date.as_deref()),
            title: normalize_title(q.title.as_deref()),
            reading_time_minutes: parse_reading_time(q.reading_time.as_deref()),
        }
    }

    /// 页脚日期（YYYY-MM-DD，UTC）
    pub fn formatted_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// 阅读时长片段；不足 1 分钟时整段省略
    pub fn reading_time_label(&self) -> Option<String> {
        if self.reading_time_minutes >= 1.0 {
            Some(format!("{} min", self.reading_time_minutes))
        } else {
            None
        }
    }
}

pub fn normalize_title(raw: Option<&str>) -> String {
    match raw {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    }
}

/// 解析日期；缺失或无法解析时回落到纪元时间。
///
/// 回落行为保留了上游的既有表现，但每次都会打 warn 日志，便于排查调用方传参问题。
pub fn parse_date(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DateTime::<Utc>::UNIX_EPOCH;
    };
    match try_parse_date(raw) {
        Some(dt) => dt,
        None => {
            tracing::warn!(date = raw, "date 参数无法解析，回落到 1970-01-01");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

fn try_parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // 不带时区的日期时间按 UTC 处理
    const NAIVE_DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
        }
    }

    // "YYYY-MM" 与 "YYYY"
    let mut parts = raw.splitn(2, '-');
    let year = parts.next().filter(|y| y.len() == 4)?.parse::<i32>().ok()?;
    let month = match parts.next() {
        Some(m) if m.len() == 2 => m.parse::<u32>().ok()?,
        Some(_) => return None,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// 解析阅读时长；缺失、非数字、负数或非有限值都视为 0。
pub fn parse_reading_time(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}
