//! End-to-end driver tests against scripted console replies.

use chrono::NaiveTime;
use vantage_device::{DeviceError, Model, Station};
use vantage_frame::encode_frame;
use vantage_schema::Value;
use vantage_transport::ReplayTransport;

fn set_u16(payload: &mut [u8], at: usize, value: u16) {
    payload[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn set_i16(payload: &mut [u8], at: usize, value: i16) {
    payload[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

/// A realistic LOOP1 payload: a mild summer morning with yesterday's
/// quarter inch of rain still on the counter and no storm in progress.
fn loop1_fixture() -> Vec<u8> {
    let mut p = vec![0u8; 97];
    p[..3].copy_from_slice(b"LOO");
    p[3] = 236; // bar trend: falling slowly (-20)
    p[4] = 0; // package type: LOOP1
    set_u16(&mut p, 5, 57); // next archive record
    set_u16(&mut p, 7, 29921); // barometer, thousandths of inHg
    set_i16(&mut p, 9, 721); // inside temp, tenths
    p[11] = 40; // inside humidity
    set_i16(&mut p, 12, 725); // outside temp, tenths
    p[14] = 5; // wind speed
    p[15] = 7; // 10-min average wind
    set_u16(&mut p, 16, 270); // wind direction
    p[18] = 151; // extra temp 1: 61 °F after the +90 bias
    for at in 19..33 {
        p[at] = 255; // remaining extra/soil/leaf sensors absent
    }
    p[33] = 52; // outside humidity
    for at in 34..41 {
        p[at] = 255; // extra humidities absent
    }
    set_u16(&mut p, 41, 0); // rain rate
    p[43] = 255; // UV absent
    set_u16(&mut p, 44, 32767); // solar absent
    set_u16(&mut p, 46, 0xFFFF); // no storm
    set_u16(&mut p, 48, 0xFFFF); // no storm start date
    set_u16(&mut p, 50, 25); // day rain: 0.25 in
    set_u16(&mut p, 52, 150); // month rain
    set_u16(&mut p, 54, 1690); // year rain
    set_u16(&mut p, 56, 2); // day ET, thousandths
    set_u16(&mut p, 58, 30); // month ET, hundredths
    set_u16(&mut p, 60, 320); // year ET, hundredths
    for at in 62..70 {
        p[at] = 255; // soil moisture / leaf wetness absent
    }
    p[86] = 0; // transmitter battery ok
    set_u16(&mut p, 87, 860); // console battery raw counts
    p[89] = 6; // forecast icons: partly cloudy + rain
    p[90] = 45; // forecast rule
    set_u16(&mut p, 91, 632); // sunrise 06:32
    set_u16(&mut p, 93, 1918); // sunset 19:18
    p[95] = 0x0A;
    p[96] = 0x0D;
    p
}

/// A LOOP2 payload disagreeing with LOOP1 where it can, to make merge
/// precedence observable.
fn loop2_fixture() -> Vec<u8> {
    let mut p = vec![0u8; 97];
    p[..3].copy_from_slice(b"LOO");
    p[3] = 236;
    p[4] = 1; // package type: LOOP2
    set_u16(&mut p, 7, 29921);
    set_i16(&mut p, 9, 721);
    p[11] = 40;
    set_i16(&mut p, 12, 990); // outside temp 99.0, deliberately different
    p[14] = 5;
    set_u16(&mut p, 16, 270);
    set_u16(&mut p, 18, 68); // 10-min average, tenths
    set_u16(&mut p, 20, 43); // 2-min average, tenths
    set_u16(&mut p, 22, 112); // 10-min gust, tenths
    set_u16(&mut p, 24, 255); // gust direction
    set_i16(&mut p, 30, 55); // dew point
    p[33] = 52;
    set_i16(&mut p, 35, 78); // heat index
    set_i16(&mut p, 37, 255); // wind chill absent
    set_i16(&mut p, 39, 255); // THSW absent
    set_u16(&mut p, 41, 10); // rain rate: 0.10 in/h
    p[43] = 255;
    set_u16(&mut p, 44, 32767);
    set_u16(&mut p, 46, 0xFFFF);
    set_u16(&mut p, 48, 0xFFFF);
    set_u16(&mut p, 50, 25);
    set_u16(&mut p, 52, 4); // last 15 min
    set_u16(&mut p, 54, 10); // last hour
    set_u16(&mut p, 56, 2);
    set_u16(&mut p, 58, 31); // last 24 h
    p[60] = 1; // reduction method
    set_i16(&mut p, 61, 13); // user offset
    set_i16(&mut p, 63, -4); // calibration offset
    set_u16(&mut p, 65, 29917);
    set_u16(&mut p, 67, 29850); // absolute pressure
    set_u16(&mut p, 69, 29958); // altimeter
    p[73] = 12; // graph pointers
    p[95] = 0x0A;
    p[96] = 0x0D;
    p
}

fn number(value: f64) -> Option<Value> {
    Some(Value::Number(value))
}

#[test]
fn loop1_fetch_parses_the_whole_record() {
    let transport = ReplayTransport::new()
        .exchange(b"\n", [0x0A, 0x0D])
        .exchange(b"LPS 1 1\n", encode_frame(&loop1_fixture()));
    let mut station = Station::new(transport, Model::VantagePro);
    station.open().unwrap();
    station.wake_up().unwrap();

    let record = station.loop1().unwrap();

    assert_eq!(record.get("package_type").cloned(), number(0.0));
    assert_eq!(record.get("next_archive_record").cloned(), number(57.0));
    assert_eq!(record.lookup("pressure.current").cloned(), number(29.921));
    assert_eq!(record.lookup("pressure.current_raw").cloned(), number(29921.0));
    assert_eq!(record.lookup("pressure.trend").cloned(), number(-20.0));
    assert_eq!(record.lookup("temperature.in").cloned(), number(72.1));
    assert_eq!(record.lookup("temperature.out").cloned(), number(72.5));
    assert_eq!(record.lookup("humidity.in").cloned(), number(40.0));
    assert_eq!(record.lookup("humidity.out").cloned(), number(52.0));
    assert_eq!(record.lookup("wind.current").cloned(), number(5.0));
    assert_eq!(record.lookup("wind.direction").cloned(), number(270.0));

    let extra = record.lookup("temperature.extra").unwrap().as_seq().unwrap();
    assert_eq!(extra[0], Value::Number(61.0));
    assert_eq!(extra[1], Value::Null);

    assert_eq!(record.lookup("rain.day").cloned(), number(0.25));
    assert_eq!(record.lookup("rain.year").cloned(), number(16.9));
    assert_eq!(record.lookup("rain.storm").cloned(), Some(Value::Null));
    assert_eq!(record.lookup("rain.storm_start").cloned(), Some(Value::Null));
    assert_eq!(record.lookup("et.day").cloned(), number(0.002));
    assert_eq!(record.get("uv").cloned(), Some(Value::Null));
    assert_eq!(record.get("solar_radiation").cloned(), Some(Value::Null));
    assert_eq!(record.lookup("battery.console_voltage").cloned(), number(5.04));
    assert_eq!(
        record.lookup("sun.sunrise").cloned(),
        Some(Value::Time(NaiveTime::from_hms_opt(6, 32, 0).unwrap()))
    );
    assert_eq!(
        record.lookup("sun.sunset").cloned(),
        Some(Value::Time(NaiveTime::from_hms_opt(19, 18, 0).unwrap()))
    );
    assert_eq!(record.lookup("alarms.high_rain_rate").cloned(), number(0.0));
}

#[test]
fn loop2_fetch_reassembles_two_bursts() {
    let wire = encode_frame(&loop2_fixture());
    let (first, second) = wire.split_at(50);
    let transport = ReplayTransport::new()
        .exchange(b"\n", [0x0A, 0x0D])
        .exchange_chunked(b"LPS 2 1\n", &[first, second]);
    let mut station = Station::new(transport, Model::VantagePro2);
    station.open().unwrap();
    station.wake_up().unwrap();

    let record = station.loop2().unwrap();

    assert_ne!(record.get("package_type").cloned(), number(0.0));
    assert_eq!(record.lookup("wind.avg_2min").cloned(), number(4.3));
    assert_eq!(record.lookup("wind.gust.speed").cloned(), number(11.2));
    assert_eq!(record.get("dew_point").cloned(), number(55.0));
    assert_eq!(record.get("wind_chill").cloned(), Some(Value::Null));
    assert_eq!(record.lookup("pressure.absolute").cloned(), number(29.85));
    assert_eq!(
        record.lookup("pressure.calibration_offset").cloned(),
        number(-0.004)
    );
    assert_eq!(record.lookup("rain.last_hour").cloned(), number(0.10));
    assert_eq!(
        record.lookup("graph_pointers.next_10min_wind_speed").cloned(),
        number(12.0)
    );
}

#[test]
fn loop2_without_second_burst_times_out() {
    let wire = encode_frame(&loop2_fixture());
    let transport = ReplayTransport::new()
        .exchange(b"\n", [0x0A, 0x0D])
        .exchange_chunked(b"LPS 2 1\n", &[&wire[..50]]);
    let mut station = Station::with_engine_config(
        transport,
        Model::VantagePro2,
        vantage_device::EngineConfig {
            read_timeout: std::time::Duration::from_millis(40),
            ..Default::default()
        },
    );
    station.open().unwrap();
    station.wake_up().unwrap();

    assert!(matches!(station.loop2(), Err(DeviceError::Timeout(_))));
}

#[test]
fn rich_realtime_data_merges_loop2_over_loop1() {
    let loop2_wire = encode_frame(&loop2_fixture());
    let (first, second) = loop2_wire.split_at(60);
    let transport = ReplayTransport::new()
        .exchange(b"\n", [0x0A, 0x0D])
        .exchange(b"LPS 1 1\n", encode_frame(&loop1_fixture()))
        .exchange_chunked(b"LPS 2 1\n", &[first, second]);
    let mut station = Station::new(transport, Model::VantagePro2);
    station.open().unwrap();
    station.wake_up().unwrap();

    let rich = station.rich_realtime_data().unwrap();

    // LOOP2 wins on shared fields.
    assert_eq!(rich.lookup("temperature.out").cloned(), number(99.0));
    // Substructures only LOOP1 carries survive the merge.
    assert_eq!(
        rich.lookup("temperature.extra").unwrap().as_seq().unwrap()[0],
        Value::Number(61.0)
    );
    assert_eq!(
        rich.lookup("sun.sunrise").cloned(),
        Some(Value::Time(NaiveTime::from_hms_opt(6, 32, 0).unwrap()))
    );
    // Rain is unified from both packets.
    assert_eq!(rich.lookup("rain.day").cloned(), number(0.25));
    assert_eq!(rich.lookup("rain.last_hour").cloned(), number(0.10));
    assert_eq!(rich.lookup("rain.storm").cloned(), Some(Value::Null));
    // ET comes from LOOP1 (LOOP2's day-only block is dropped).
    assert_eq!(rich.lookup("et.month").cloned(), number(0.3));
    // Merge-only view: no package bookkeeping, alarms or graph pointers.
    assert_eq!(rich.get("package_type"), None);
    assert_eq!(rich.get("next_archive_record"), None);
    assert_eq!(rich.get("alarms"), None);
    assert_eq!(rich.get("graph_pointers"), None);
}

#[test]
fn parsed_records_export_as_json() {
    let transport = ReplayTransport::new()
        .exchange(b"LPS 1 1\n", encode_frame(&loop1_fixture()));
    let mut station = Station::new(transport, Model::VantagePro);
    station.open().unwrap();

    let record = station.loop1().unwrap();
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["temperature"]["out"], 72.5);
    assert_eq!(json["rain"]["storm"], serde_json::Value::Null);
    assert_eq!(json["sun"]["sunrise"], "06:32");
}

#[test]
fn highs_and_lows_fetch_parses_extremes_and_their_times() {
    let mut p = vec![0u8; 436];
    set_u16(&mut p, 0, 29512); // pressure day low
    set_u16(&mut p, 2, 30102); // pressure day high
    set_u16(&mut p, 12, 358); // low at 03:58
    set_u16(&mut p, 14, 65535); // high time dashed
    p[16] = 38; // wind day high
    set_u16(&mut p, 17, 1305); // at 13:05
    set_i16(&mut p, 47, 418); // outside temp day low, tenths
    set_i16(&mut p, 49, 892); // outside temp day high
    set_u16(&mut p, 51, 558); // low at 05:58
    set_u16(&mut p, 53, 1512); // high at 15:12
    set_i16(&mut p, 55, 901); // month high
    set_i16(&mut p, 57, 32767); // month low dashed
    set_u16(&mut p, 116, 120); // rain rate day high: 1.20 in/h
    set_u16(&mut p, 118, 901); // at 09:01
    p[126] = 140; // extra temp sensor 1 day low: 50 °F
    p[127] = 255; // sensor 2 absent
    set_u16(&mut p, 156, 444); // sensor 1 low at 04:44
    set_u16(&mut p, 158, 444); // sensor 2 time present but extreme dashed
    p[276] = 28; // outside humidity day low
    p[284] = 78; // outside humidity day high

    let transport = ReplayTransport::new()
        .exchange(b"\n", [0x0A, 0x0D])
        .exchange(b"HILOWS\n", encode_frame(&p));
    let mut station = Station::new(transport, Model::VantagePro);
    station.open().unwrap();
    station.wake_up().unwrap();

    let record = station.highs_and_lows().unwrap();

    assert_eq!(record.lookup("pressure.day_low").cloned(), number(29.512));
    assert_eq!(record.lookup("pressure.day_high").cloned(), number(30.102));
    assert_eq!(
        record.lookup("pressure.day_low_time").cloned(),
        Some(Value::Time(NaiveTime::from_hms_opt(3, 58, 0).unwrap()))
    );
    assert_eq!(
        record.lookup("pressure.day_high_time").cloned(),
        Some(Value::Null)
    );
    assert_eq!(record.lookup("wind.day_high").cloned(), number(38.0));
    assert_eq!(
        record.lookup("wind.day_high_time").cloned(),
        Some(Value::Time(NaiveTime::from_hms_opt(13, 5, 0).unwrap()))
    );
    assert_eq!(record.lookup("temperature_out.day_low").cloned(), number(41.8));
    assert_eq!(record.lookup("temperature_out.day_high").cloned(), number(89.2));
    assert_eq!(record.lookup("temperature_out.month_high").cloned(), number(90.1));
    assert_eq!(
        record.lookup("temperature_out.month_low").cloned(),
        Some(Value::Null)
    );
    assert_eq!(record.lookup("rain_rate.day_high").cloned(), number(1.2));

    let extra = record
        .get("extra_temperatures")
        .unwrap()
        .as_seq()
        .unwrap();
    let first = extra[0].as_record().unwrap();
    assert_eq!(first.get("day_low").cloned(), number(50.0));
    assert_eq!(
        first.get("day_low_time").cloned(),
        Some(Value::Time(NaiveTime::from_hms_opt(4, 44, 0).unwrap()))
    );
    let second = extra[1].as_record().unwrap();
    assert_eq!(second.get("day_low").cloned(), Some(Value::Null));
    // The time is present on the wire but nulled by its dashed extreme.
    assert_eq!(second.get("day_low_time").cloned(), Some(Value::Null));

    let humidity = record.get("humidity_out").unwrap().as_seq().unwrap();
    let outside = humidity[0].as_record().unwrap();
    assert_eq!(outside.get("day_low").cloned(), number(28.0));
    assert_eq!(outside.get("day_high").cloned(), number(78.0));
}
