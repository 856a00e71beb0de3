//! HILOW: daily, monthly and yearly extremes, answered to `HILOWS`.
//!
//! The packet groups values by field, not by sensor: all day-lows of a
//! block are contiguous, then all day-highs, and so on. The repeated
//! sensor blocks therefore use property-based arrays, and every
//! time-of-extreme field is valid only while its extreme is.

use vantage_schema::{ArrayKind, FieldSpec, Schema, SchemaNode, Transform};

fn tenths(position: f64) -> FieldSpec {
    FieldSpec::i16(position)
        .nullables(&[32767, -32768])
        .transform(Transform::Scale(0.1))
        .transform(Transform::Round(1))
}

fn whole_degrees(position: f64) -> FieldSpec {
    FieldSpec::i16(position).nullables(&[32767, -32768, 255])
}

fn clicks(position: f64) -> FieldSpec {
    FieldSpec::u16(position)
        .transform(Transform::Scale(0.01))
        .transform(Transform::Round(2))
}

fn time_of(position: f64, extreme: &str) -> FieldSpec {
    FieldSpec::u16(position)
        .nullable(65535)
        .transform(Transform::TimeOfDay)
        .depends_on(extreme)
}

pub(super) fn schema() -> Schema {
    Schema::new()
        .object("pressure", pressure())
        .object("wind", wind())
        .object("temperature_in", temperature_in())
        .object("humidity_in", humidity_in())
        .object("temperature_out", temperature_out())
        .object("dew_point", dew_point())
        .object("wind_chill", wind_chill())
        .object("heat_index", heat_index())
        .object("thsw", thsw())
        .object("solar_radiation", solar())
        .object("uv", uv())
        .object("rain_rate", rain_rate())
        .array(
            "extra_temperatures",
            SchemaNode::Object(extra_temperature_block()),
            15,
            ArrayKind::PropertyBased,
        )
        .array(
            "humidity_out",
            SchemaNode::Object(humidity_block()),
            8,
            ArrayKind::PropertyBased,
        )
        .array(
            "soil_moisture",
            SchemaNode::Object(soil_leaf_block(356.0)),
            4,
            ArrayKind::PropertyBased,
        )
        .array(
            "leaf_wetness",
            SchemaNode::Object(soil_leaf_block(396.0)),
            4,
            ArrayKind::PropertyBased,
        )
}

fn pressure() -> Schema {
    let thousandths = |position: f64| {
        FieldSpec::u16(position)
            .nullable(0)
            .transform(Transform::Scale(0.001))
            .transform(Transform::Round(3))
    };
    Schema::new()
        .field("day_low", thousandths(0.0))
        .field("day_high", thousandths(2.0))
        .field("month_low", thousandths(4.0))
        .field("month_high", thousandths(6.0))
        .field("year_low", thousandths(8.0))
        .field("year_high", thousandths(10.0))
        .field("day_low_time", time_of(12.0, "day_low"))
        .field("day_high_time", time_of(14.0, "day_high"))
}

fn wind() -> Schema {
    Schema::new()
        .field("day_high", FieldSpec::u8(16.0).nullable(255))
        .field("day_high_time", time_of(17.0, "day_high"))
        .field("month_high", FieldSpec::u8(19.0).nullable(255))
        .field("year_high", FieldSpec::u8(20.0).nullable(255))
}

fn temperature_in() -> Schema {
    Schema::new()
        .field("day_high", tenths(21.0))
        .field("day_low", tenths(23.0))
        .field("day_high_time", time_of(25.0, "day_high"))
        .field("day_low_time", time_of(27.0, "day_low"))
        .field("month_low", tenths(29.0))
        .field("month_high", tenths(31.0))
        .field("year_low", tenths(33.0))
        .field("year_high", tenths(35.0))
}

fn humidity_in() -> Schema {
    let percent = |position: f64| FieldSpec::u8(position).nullable(255);
    Schema::new()
        .field("day_high", percent(37.0))
        .field("day_low", percent(38.0))
        .field("day_high_time", time_of(39.0, "day_high"))
        .field("day_low_time", time_of(41.0, "day_low"))
        .field("month_high", percent(43.0))
        .field("month_low", percent(44.0))
        .field("year_high", percent(45.0))
        .field("year_low", percent(46.0))
}

fn temperature_out() -> Schema {
    Schema::new()
        .field("day_low", tenths(47.0))
        .field("day_high", tenths(49.0))
        .field("day_low_time", time_of(51.0, "day_low"))
        .field("day_high_time", time_of(53.0, "day_high"))
        .field("month_high", tenths(55.0))
        .field("month_low", tenths(57.0))
        .field("year_high", tenths(59.0))
        .field("year_low", tenths(61.0))
}

fn dew_point() -> Schema {
    Schema::new()
        .field("day_low", whole_degrees(63.0))
        .field("day_high", whole_degrees(65.0))
        .field("day_low_time", time_of(67.0, "day_low"))
        .field("day_high_time", time_of(69.0, "day_high"))
        .field("month_high", whole_degrees(71.0))
        .field("month_low", whole_degrees(73.0))
        .field("year_high", whole_degrees(75.0))
        .field("year_low", whole_degrees(77.0))
}

fn wind_chill() -> Schema {
    Schema::new()
        .field("day_low", whole_degrees(79.0))
        .field("day_low_time", time_of(81.0, "day_low"))
        .field("month_low", whole_degrees(83.0))
        .field("year_low", whole_degrees(85.0))
}

fn heat_index() -> Schema {
    Schema::new()
        .field("day_high", whole_degrees(87.0))
        .field("day_high_time", time_of(89.0, "day_high"))
        .field("month_high", whole_degrees(91.0))
        .field("year_high", whole_degrees(93.0))
}

fn thsw() -> Schema {
    Schema::new()
        .field("day_high", whole_degrees(95.0))
        .field("day_high_time", time_of(97.0, "day_high"))
        .field("month_high", whole_degrees(99.0))
        .field("year_high", whole_degrees(101.0))
}

fn solar() -> Schema {
    let watts = |position: f64| FieldSpec::u16(position).nullable(32767);
    Schema::new()
        .field("day_high", watts(103.0))
        .field("day_high_time", time_of(105.0, "day_high"))
        .field("month_high", watts(107.0))
        .field("year_high", watts(109.0))
}

fn uv() -> Schema {
    let index = |position: f64| {
        FieldSpec::u8(position)
            .nullable(255)
            .transform(Transform::Scale(0.1))
    };
    Schema::new()
        .field("day_high", index(111.0))
        .field("day_high_time", time_of(112.0, "day_high"))
        .field("month_high", index(114.0))
        .field("year_high", index(115.0))
}

fn rain_rate() -> Schema {
    Schema::new()
        .field("day_high", clicks(116.0))
        .field("day_high_time", time_of(118.0, "day_high"))
        .field("hour_high", clicks(120.0))
        .field("month_high", clicks(122.0))
        .field("year_high", clicks(124.0))
}

/// One of the 15 extra/soil/leaf temperature sensors (entries 0–6 extra,
/// 7–10 soil, 11–14 leaf).
fn extra_temperature_block() -> Schema {
    let biased = |position: f64| {
        FieldSpec::u8(position)
            .nullable(255)
            .transform(Transform::Offset(-90.0))
    };
    Schema::new()
        .field("day_low", biased(126.0))
        .field("day_high", biased(141.0))
        .field("day_low_time", time_of(156.0, "day_low"))
        .field("day_high_time", time_of(186.0, "day_high"))
        .field("month_high", biased(216.0))
        .field("month_low", biased(231.0))
        .field("year_high", biased(246.0))
        .field("year_low", biased(261.0))
}

/// One of the 8 humidity sensors (entry 0 is the outside sensor).
fn humidity_block() -> Schema {
    let percent = |position: f64| FieldSpec::u8(position).nullable(255);
    Schema::new()
        .field("day_low", percent(276.0))
        .field("day_high", percent(284.0))
        .field("day_low_time", time_of(292.0, "day_low"))
        .field("day_high_time", time_of(308.0, "day_high"))
        .field("month_high", percent(324.0))
        .field("month_low", percent(332.0))
        .field("year_high", percent(340.0))
        .field("year_low", percent(348.0))
}

/// Soil-moisture and leaf-wetness blocks share one shape at different bases.
fn soil_leaf_block(base: f64) -> Schema {
    let counts = |offset: f64| FieldSpec::u8(base + offset).nullable(255);
    Schema::new()
        .field("day_high", counts(0.0))
        .field("day_high_time", time_of(base + 4.0, "day_high"))
        .field("day_low", counts(12.0))
        .field("day_low_time", time_of(base + 16.0, "day_low"))
        .field("month_low", counts(24.0))
        .field("month_high", counts(28.0))
        .field("year_low", counts(32.0))
        .field("year_high", counts(36.0))
}
