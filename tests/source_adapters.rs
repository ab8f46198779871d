//! Vendor adapters end to end: fetch through the retrying fetcher, parse,
//! normalize.

mod helpers;

use serde_json::json;
use threat_harvest::config::{NewsFeed, USER_AGENTS};
use threat_harvest::lookup::{CountryTable, KeywordClassifier, NoopLocator, SimpleFeedParser};
use threat_harvest::sources::{fetch_feed, fetch_fortiguard, fetch_ip_source, fetch_radware, IpSource};
use threat_harvest::{EventKind, IpKind};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{mock_endpoints, recording_fetcher};

#[tokio::test]
async fn test_fortiguard_pins_identity_and_maps_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fortiguard"))
        .and(query_param("outbreak_id", "0"))
        .and(header("user-agent", USER_AGENTS[0]))
        .and(header("referer", "https://fortiguard.fortinet.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ips": {
                "1717000000": [
                    {
                        "count": 12, "vuln_name": "MS.SMB.Server.Traffic.Overflow",
                        "vuln_type": "DoS", "src_country": "CN", "src_lat": 35.0,
                        "src_long": 105.0, "dest_country": "US", "dest_lat": 38.0,
                        "dest_long": -97.0, "timestamp": "2024-05-29T16:26:40"
                    },
                    "garbage"
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let countries = CountryTable::builtin().unwrap();
    let (fetcher, _, stats) = recording_fetcher(3);
    let records = fetch_fortiguard(
        &fetcher,
        &format!("{}/fortiguard", server.uri()),
        &countries,
    )
    .await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.attack_count, Some(12));
    assert_eq!(record.source_country_code.as_deref(), Some("CN"));
    assert_eq!(record.destination_country_name.as_deref(), Some("United States"));
    assert_eq!(record.timestamp, "2024-05-29T16:26:40");
    assert_eq!(stats.get(EventKind::MalformedItem), 1);
}

#[tokio::test]
async fn test_radware_uses_centroids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/radware"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [
                {"type": "Intrusion", "sourceCountry": "DE", "destinationCountry": "FR",
                 "attackTime": "2024-05-29T16:00:00Z"},
                {"type": "Scanner", "sourceCountry": "", "destinationCountry": "FR"}
            ]
        ])))
        .mount(&server)
        .await;

    let countries = CountryTable::builtin().unwrap();
    let (fetcher, _, _) = recording_fetcher(1);
    let records = fetch_radware(&fetcher, &format!("{}/radware", server.uri()), &countries).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].attack_name.as_deref(), Some("Intrusion"));
    assert_eq!(records[0].attack_type.as_deref(), Some("Intrusion"));
    assert!(records[0].attack_count.is_none());
    assert!(records[0].source_latitude.is_some());
    assert!(records[1].source_country_code.is_none());
    assert!(records[1].country_pair().is_none());
}

#[tokio::test]
async fn test_radware_unavailable_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let countries = CountryTable::builtin().unwrap();
    let (fetcher, sleeper, stats) = recording_fetcher(2);
    let records = fetch_radware(&fetcher, &format!("{}/radware", server.uri()), &countries).await;

    assert!(records.is_empty());
    assert_eq!(sleeper.recorded().len(), 1);
    assert_eq!(stats.get(EventKind::SourceUnavailable), 1);
}

#[tokio::test]
async fn test_reputation_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alienvault"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "1.2.3.4#4#2#Malicious Host#CN#Beijing#39.9,116.3#3\n\
             999.999.999.999#4#2#Scanning Host#US##0,0#3\n\
             5.6.7.8#4#2#Scanning Host#US##0,0#3\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/banlist"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "# Binary Defense banlist\n\n10.0.0.1\nnot-an-ip\n10.0.0.1\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fraudguard"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<script>const threatData = [{"ip": "8.8.4.4", "country": "US"}, {"country": "RU"}];</script>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/talos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spam": [{"ip": "203.0.113.9"}, {"ip": "203.0.113.1"}]
        })))
        .mount(&server)
        .await;

    let endpoints = mock_endpoints(&server.uri());
    let (fetcher, _, stats) = recording_fetcher(1);

    let alienvault = fetch_ip_source(IpSource::AlienVault, &fetcher, &endpoints, &NoopLocator).await;
    let ips: Vec<&str> = alienvault.iter().map(|r| r.ip.as_str()).collect();
    assert_eq!(ips, vec!["1.2.3.4", "5.6.7.8"]);
    assert!(alienvault.iter().all(|r| r.kind == IpKind::Malicious && r.latitude.is_none()));

    let banlist = fetch_ip_source(IpSource::BdBanlist, &fetcher, &endpoints, &NoopLocator).await;
    assert_eq!(banlist.len(), 1);
    assert_eq!(banlist[0].ip, "10.0.0.1");

    let fraudguard = fetch_ip_source(IpSource::FraudGuard, &fetcher, &endpoints, &NoopLocator).await;
    assert_eq!(fraudguard.len(), 1);
    assert_eq!(fraudguard[0].ip, "8.8.4.4");

    let talos = fetch_ip_source(IpSource::Talos, &fetcher, &endpoints, &NoopLocator).await;
    let ips: Vec<&str> = talos.iter().map(|r| r.ip.as_str()).collect();
    assert_eq!(ips, vec!["203.0.113.1", "203.0.113.9"]);
    assert!(talos.iter().all(|r| r.kind == IpKind::Spam));

    // 999.999.999.999, not-an-ip, and the fraudguard entry without an ip
    assert_eq!(stats.get(EventKind::InvalidIp), 3);
}

#[tokio::test]
async fn test_news_feed_keeps_relevant_entries() {
    let server = MockServer::start().await;
    let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Security Wire</title>
  <item>
    <title><![CDATA[New ransomware strain hits hospitals]]></title>
    <link>https://news.example/ransomware</link>
    <description>Attackers deployed a backdoor &amp; encrypted records.</description>
    <pubDate>Wed, 29 May 2024 10:00:00 GMT</pubDate>
  </item>
  <item>
    <title>Join our security webinar</title>
    <link>https://news.example/webinar</link>
    <description>Register now for the malware deep dive.</description>
  </item>
  <item>
    <title>Quarterly earnings call</title>
    <link>https://news.example/earnings</link>
  </item>
  <item>
    <title>Untitled exploit post</title>
  </item>
</channel></rss>"#;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss))
        .mount(&server)
        .await;

    let feed = NewsFeed::new("wire", format!("{}/feed", server.uri()));
    let (fetcher, _, _) = recording_fetcher(1);
    let parsed = fetch_feed(
        &feed,
        &fetcher,
        &SimpleFeedParser,
        &KeywordClassifier::default(),
    )
    .await;

    assert_eq!(parsed.items.len(), 1);
    assert_eq!(parsed.items[0].title, "New ransomware strain hits hospitals");
    assert_eq!(parsed.items[0].link, "https://news.example/ransomware");
    assert_eq!(parsed.items[0].timestamp, "Wed, 29 May 2024 10:00:00 GMT");
    assert_eq!(parsed.malformed, 1);
}
