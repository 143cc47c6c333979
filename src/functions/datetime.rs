//! Date and time functions over ISO 8601 timestamp strings.
//!
//! Timestamps are parsed as UTC unless they carry an offset. Output formats
//! use .NET-style custom format strings (`yyyy-MM-dd HH:mm`) and the common
//! single-letter standard formats; the default is
//! `yyyy-MM-ddTHH:mm:ss.fffZ`. Ticks are 100 ns units since 0001-01-01.
//!
//! Every function that takes an output format also takes an optional locale
//! after it (`fr-FR`, `de_DE`, `es`), used for month and day names and the
//! AM/PM designator. The default is `en-US`.

use chrono::{
    DateTime, Datelike, Duration, Locale, Months, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};

use super::utils::{apply, evaluate_children, int_arg, num_arg, opt_str_arg, order, str_arg};
use crate::{
    error::EvalError,
    evaluator::{EvalResult, ExpressionEvaluator, Options, ReturnType},
    expression::Expression,
    memory::Memory,
    value::Value,
};

/// Ticks at the Unix epoch
const EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

const DEFAULT_FORMAT: &str = "yyyy-MM-ddTHH:mm:ss.fffZ";
const LOCAL_FORMAT: &str = "yyyy-MM-ddTHH:mm:ss.fff";
const DEFAULT_LOCALE: Locale = Locale::en_US;

const STRING: ReturnType = ReturnType::STRING;
const NUMBER: ReturnType = ReturnType::NUMBER;
const STRING_OR_NUMBER: ReturnType = STRING.union(NUMBER);

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// ========================================
// Parsing
// ========================================

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_timestamp(function: &str, text: &str) -> Result<DateTime<Utc>, EvalError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive(text).map(|naive| naive.and_utc()))
        .ok_or_else(|| EvalError::function(function, format!("'{}' is not a valid timestamp", text)))
}

fn timestamp_arg(function: &str, args: &[Value], index: usize) -> Result<DateTime<Utc>, EvalError> {
    parse_timestamp(function, str_arg(function, args, index)?)
}

fn from_ticks(function: &str, ticks: i64) -> Result<DateTime<Utc>, EvalError> {
    let out_of_range = || EvalError::function(function, format!("{} ticks is out of range", ticks));
    let since_epoch = ticks.checked_sub(EPOCH_TICKS).ok_or_else(out_of_range)?;
    let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(seconds, nanos).ok_or_else(out_of_range)
}

fn to_ticks(function: &str, dt: &DateTime<Utc>) -> Result<i64, EvalError> {
    dt.timestamp()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(EPOCH_TICKS))
        .and_then(|ticks| ticks.checked_add(i64::from(dt.timestamp_subsec_nanos() / 100)))
        .ok_or_else(|| EvalError::function(function, format!("{} is outside the tick range", dt)))
}

// ========================================
// Locales
// ========================================

/// Resolve a culture name. A bare language falls back to its main region.
fn parse_locale(function: &str, name: &str) -> Result<Locale, EvalError> {
    let tag = name.trim().replace('-', "_");
    let regional = match tag.split_once('_') {
        Some((language, region)) => format!("{}_{}", language.to_ascii_lowercase(), region.to_ascii_uppercase()),
        None if tag.eq_ignore_ascii_case("en") => "en_US".to_string(),
        None => format!("{}_{}", tag.to_ascii_lowercase(), tag.to_ascii_uppercase()),
    };
    Locale::try_from(tag.as_str())
        .or_else(|_| Locale::try_from(regional.as_str()))
        .map_err(|_| EvalError::function(function, format!("'{}' is not a known locale", name)))
}

fn locale_arg(function: &str, args: &[Value], index: usize) -> Result<Locale, EvalError> {
    opt_str_arg(function, args, index)?.map_or(Ok(DEFAULT_LOCALE), |name| parse_locale(function, name))
}

// ========================================
// Formatting
// ========================================

fn expand_standard(format: &str) -> &str {
    match format {
        "o" | "O" => "yyyy-MM-ddTHH:mm:ss.fffffffK",
        "s" => "yyyy-MM-ddTHH:mm:ss",
        "u" => "yyyy-MM-dd HH:mm:ssZ",
        "D" => "dddd, dd MMMM yyyy",
        "d" => "M/d/yyyy",
        "t" => "h:mm tt",
        "T" => "h:mm:ss tt",
        "g" => "M/d/yyyy h:mm tt",
        "G" => "M/d/yyyy h:mm:ss tt",
        custom => custom,
    }
}

fn pad(n: i64, width: usize) -> String {
    format!("{:0width$}", n, width = width)
}

fn offset_text(seconds: i32, width: usize) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let (hours, minutes) = (seconds.abs() / 3600, seconds.abs() % 3600 / 60);
    match width {
        1 => format!("{}{}", sign, hours),
        2 => format!("{}{:02}", sign, hours),
        _ => format!("{}{:02}:{:02}", sign, hours, minutes),
    }
}

/// Render a timestamp with a .NET-style format string.
fn render<Tz: TimeZone>(dt: &DateTime<Tz>, format: &str, locale: Locale) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chars: Vec<char> = expand_standard(format).chars().collect();
    let offset = dt.offset().fix().local_minus_utc();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' || c == '"' {
            i += 1;
            while i < chars.len() && chars[i] != c {
                out.push(chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if c == '\\' {
            if let Some(next) = chars.get(i + 1) {
                out.push(*next);
            }
            i += 2;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }
        let hour12 = match dt.hour() % 12 {
            0 => 12,
            h => h,
        };
        match c {
            'y' if run <= 2 => out.push_str(&pad(i64::from(dt.year() % 100), run)),
            'y' => out.push_str(&pad(i64::from(dt.year()), run)),
            'M' if run >= 4 => out.push_str(&dt.format_localized("%B", locale).to_string()),
            'M' if run == 3 => out.push_str(&dt.format_localized("%b", locale).to_string()),
            'M' => out.push_str(&pad(i64::from(dt.month()), run)),
            'd' if run >= 4 => out.push_str(&dt.format_localized("%A", locale).to_string()),
            'd' if run == 3 => out.push_str(&dt.format_localized("%a", locale).to_string()),
            'd' => out.push_str(&pad(i64::from(dt.day()), run)),
            'H' => out.push_str(&pad(i64::from(dt.hour()), run.min(2))),
            'h' => out.push_str(&pad(i64::from(hour12), run.min(2))),
            'm' => out.push_str(&pad(i64::from(dt.minute()), run.min(2))),
            's' => out.push_str(&pad(i64::from(dt.second()), run.min(2))),
            'f' | 'F' => {
                let digits = run.min(9);
                let fraction = i64::from(dt.nanosecond() % 1_000_000_000) / 10i64.pow(9 - digits as u32);
                out.push_str(&pad(fraction, digits));
            }
            't' => {
                let designator = dt.format_localized("%p", locale).to_string();
                match designator.chars().next() {
                    Some(first) if run == 1 => out.push(first),
                    _ => out.push_str(&designator),
                }
            }
            'K' if offset == 0 => out.push('Z'),
            'K' => out.push_str(&offset_text(offset, 3)),
            'z' => out.push_str(&offset_text(offset, run)),
            literal => {
                for _ in 0..run {
                    out.push(literal);
                }
            }
        }
        i += run;
    }
    out
}

/// Render with the optional format at `format_index` and locale after it.
fn render_utc(function: &str, dt: DateTime<Utc>, args: &[Value], format_index: usize) -> EvalResult {
    let format = opt_str_arg(function, args, format_index)?.unwrap_or(DEFAULT_FORMAT);
    let locale = locale_arg(function, args, format_index + 1)?;
    Ok(Value::from(render(&dt, format, locale)))
}

// ========================================
// Arithmetic
// ========================================

fn shift(function: &str, dt: DateTime<Utc>, amount: i64, unit: &str) -> Result<DateTime<Utc>, EvalError> {
    let out_of_range = || EvalError::function(function, format!("adding {} {} is out of range", amount, unit));
    let months = |n: i64| -> Result<DateTime<Utc>, EvalError> {
        let count = u32::try_from(n.unsigned_abs()).map_err(|_| out_of_range())?;
        let shifted = if n >= 0 {
            dt.checked_add_months(Months::new(count))
        } else {
            dt.checked_sub_months(Months::new(count))
        };
        shifted.ok_or_else(out_of_range)
    };

    let duration = match unit.to_ascii_lowercase().as_str() {
        "second" => Duration::try_seconds(amount),
        "minute" => Duration::try_minutes(amount),
        "hour" => Duration::try_hours(amount),
        "day" => Duration::try_days(amount),
        "week" => Duration::try_weeks(amount),
        "month" => return months(amount),
        "year" => return months(amount.checked_mul(12).ok_or_else(out_of_range)?),
        other => {
            return Err(EvalError::function(function, format!("'{}' is not a time unit", other)));
        }
    };
    duration
        .and_then(|d| dt.checked_add_signed(d))
        .ok_or_else(out_of_range)
}

fn add_unit(function: &'static str, unit: &'static str) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        function,
        STRING,
        apply(move |args| {
            let dt = timestamp_arg(function, args, 0)?;
            let shifted = shift(function, dt, int_arg(function, args, 1)?, unit)?;
            render_utc(function, shifted, args, 2)
        }),
        order(&[STRING, NUMBER], &[STRING, STRING]),
    )
}

fn add_to_time(function: &'static str, sign: i64) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        function,
        STRING,
        apply(move |args| {
            let dt = timestamp_arg(function, args, 0)?;
            let amount = int_arg(function, args, 1)?.saturating_mul(sign);
            let shifted = shift(function, dt, amount, str_arg(function, args, 2)?)?;
            render_utc(function, shifted, args, 3)
        }),
        order(&[STRING, NUMBER, STRING], &[STRING, STRING]),
    )
}

fn component(function: &'static str, f: fn(&DateTime<Utc>) -> i64) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        function,
        NUMBER,
        apply(move |args| Ok(Value::Integer(f(&timestamp_arg(function, args, 0)?)))),
        order(&[STRING], &[]),
    )
}

fn start_of(function: &'static str, truncate: fn(DateTime<Utc>) -> Option<DateTime<Utc>>) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        function,
        STRING,
        apply(move |args| {
            let dt = timestamp_arg(function, args, 0)?;
            let start = truncate(dt).ok_or_else(|| EvalError::function(function, "timestamp out of range"))?;
            render_utc(function, start, args, 1)
        }),
        order(&[STRING], &[STRING, STRING]),
    )
}

fn start_of_day(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    dt.date_naive().and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

fn start_of_hour(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    dt.date_naive().and_hms_opt(dt.hour(), 0, 0).map(|naive| naive.and_utc())
}

fn start_of_month(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    dt.date_naive()
        .with_day(1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ========================================
// Formatting functions
// ========================================

fn format_date_time(args: &[Value]) -> EvalResult {
    let dt = match &args[0] {
        Value::String(text) => parse_timestamp("formatDateTime", text)?,
        _ => epoch_seconds("formatDateTime", num_arg("formatDateTime", args, 0)?)?,
    };
    render_utc("formatDateTime", dt, args, 1)
}

fn epoch_seconds(function: &str, seconds: f64) -> Result<DateTime<Utc>, EvalError> {
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    if !whole.is_finite() || whole.abs() > 1e15 {
        return Err(EvalError::function(function, format!("{} is out of range", seconds)));
    }
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        .ok_or_else(|| EvalError::function(function, format!("{} is out of range", seconds)))
}

fn format_epoch(args: &[Value]) -> EvalResult {
    let dt = epoch_seconds("formatEpoch", num_arg("formatEpoch", args, 0)?)?;
    render_utc("formatEpoch", dt, args, 1)
}

fn format_ticks(args: &[Value]) -> EvalResult {
    let dt = from_ticks("formatTicks", int_arg("formatTicks", args, 0)?)?;
    render_utc("formatTicks", dt, args, 1)
}

fn time_of_day(args: &[Value]) -> EvalResult {
    let dt = timestamp_arg("getTimeOfDay", args, 0)?;
    let minutes = dt.hour() * 60 + dt.minute();
    let label = match minutes {
        0 => "midnight",
        1..720 => "morning",
        720 => "noon",
        721..1080 => "afternoon",
        1080..=1320 => "evening",
        _ => "night",
    };
    Ok(Value::from(label))
}

/// `dateReadBack(reference, target)`: the target date spoken relative to the
/// reference date, or `""` when neither is within two days.
fn date_read_back(args: &[Value]) -> EvalResult {
    let reference = timestamp_arg("dateReadBack", args, 0)?.date_naive();
    let target = timestamp_arg("dateReadBack", args, 1)?.date_naive();
    let label = match (target - reference).num_days() {
        0 => "today",
        1 => "tomorrow",
        -1 => "yesterday",
        2 => "the day after tomorrow",
        -2 => "the day before yesterday",
        _ => "",
    };
    Ok(Value::from(label))
}

// ========================================
// Timezones
// ========================================

fn zone(function: &str, options: &Options, name: &str) -> Result<chrono_tz::Tz, EvalError> {
    options
        .timezone_table()
        .resolve(name)
        .ok_or_else(|| EvalError::function(function, format!("'{}' is not a known timezone", name)))
}

fn convert_from_utc(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let args = evaluate_children(expr, memory, options, None)?;
    let dt = timestamp_arg("convertFromUTC", &args, 0)?;
    let tz = zone("convertFromUTC", options, str_arg("convertFromUTC", &args, 1)?)?;
    let format = opt_str_arg("convertFromUTC", &args, 2)?.unwrap_or(LOCAL_FORMAT);
    let locale = locale_arg("convertFromUTC", &args, 3)?;
    Ok(Value::from(render(&dt.with_timezone(&tz), format, locale)))
}

fn convert_to_utc(expr: &Expression, memory: &mut dyn Memory, options: &Options) -> EvalResult {
    let args = evaluate_children(expr, memory, options, None)?;
    let text = str_arg("convertToUTC", &args, 0)?;
    let tz = zone("convertToUTC", options, str_arg("convertToUTC", &args, 1)?)?;
    let local = DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| parse_naive(text))
        .ok_or_else(|| EvalError::function("convertToUTC", format!("'{}' is not a valid timestamp", text)))?;
    let utc = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| {
            EvalError::function("convertToUTC", format!("{} does not exist in {}", local, tz.name()))
        })?
        .with_timezone(&Utc);
    render_utc("convertToUTC", utc, &args, 2)
}

pub(super) fn evaluators() -> Vec<ExpressionEvaluator> {
    vec![
        add_unit("addDays", "day"),
        add_unit("addHours", "hour"),
        add_unit("addMinutes", "minute"),
        add_unit("addSeconds", "second"),
        add_to_time("addToTime", 1),
        add_to_time("subtractFromTime", -1),
        component("dayOfMonth", |dt| i64::from(dt.day())),
        component("dayOfWeek", |dt| i64::from(dt.weekday().num_days_from_sunday())),
        component("dayOfYear", |dt| i64::from(dt.ordinal())),
        component("month", |dt| i64::from(dt.month())),
        component("year", |dt| i64::from(dt.year())),
        ExpressionEvaluator::new(
            "ticks",
            NUMBER,
            apply(|args| to_ticks("ticks", &timestamp_arg("ticks", args, 0)?).map(Value::Integer)),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "date",
            STRING,
            apply(|args| {
                let dt = timestamp_arg("date", args, 0)?;
                Ok(Value::from(render(&dt, "M/d/yyyy", DEFAULT_LOCALE)))
            }),
            order(&[STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "formatDateTime",
            STRING,
            apply(format_date_time),
            order(&[STRING_OR_NUMBER], &[STRING, STRING]),
        ),
        ExpressionEvaluator::new("formatEpoch", STRING, apply(format_epoch), order(&[NUMBER], &[STRING, STRING])),
        ExpressionEvaluator::new("formatTicks", STRING, apply(format_ticks), order(&[NUMBER], &[STRING, STRING])),
        start_of("startOfDay", start_of_day),
        start_of("startOfHour", start_of_hour),
        start_of("startOfMonth", start_of_month),
        ExpressionEvaluator::new(
            "dateTimeDiff",
            NUMBER,
            apply(|args| {
                let a = timestamp_arg("dateTimeDiff", args, 0)?;
                let b = timestamp_arg("dateTimeDiff", args, 1)?;
                to_ticks("dateTimeDiff", &a)?
                    .checked_sub(to_ticks("dateTimeDiff", &b)?)
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::function("dateTimeDiff", "the difference is outside the tick range"))
            }),
            order(&[STRING, STRING], &[]),
        ),
        ExpressionEvaluator::new(
            "convertFromUTC",
            STRING,
            convert_from_utc,
            order(&[STRING, STRING], &[STRING, STRING]),
        ),
        ExpressionEvaluator::new(
            "convertToUTC",
            STRING,
            convert_to_utc,
            order(&[STRING, STRING], &[STRING, STRING]),
        ),
        ExpressionEvaluator::new("getTimeOfDay", STRING, apply(time_of_day), order(&[STRING], &[])),
        ExpressionEvaluator::new("dateReadBack", STRING, apply(date_read_back), order(&[STRING, STRING], &[])),
    ]
}
