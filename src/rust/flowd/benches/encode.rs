use criterion::{criterion_group, criterion_main, Criterion};
use flow_config::{ExporterConfig, IpfixConfig};
use flowd::encoder::RecordEncoder;
use flowd::exporter::{BatchExporter, CapturingSender};
use flowd::flow_data::{FlowKey, FlowRecord, FlowTable, HttpFields, PacketEvent, IPPROTO_TCP};
use flowd::stats::ExporterStats;
use flowd::template::TemplateManager;
use std::sync::Arc;

fn flows(n: u16) -> Vec<(FlowKey, FlowRecord)> {
    let mut table = FlowTable::new();
    for port in 0..n {
        table.ingest(
            PacketEvent::new(
                "10.0.0.1".parse().unwrap(),
                "10.0.0.2".parse().unwrap(),
                1024 + port,
                80,
                IPPROTO_TCP,
                1500,
                port as u64,
            )
            .with_tcp_flags(0x18)
            .with_http(HttpFields {
                url: "/index.html".to_string(),
                user_agent: "criterion".to_string(),
                host: "example.com".to_string(),
            }),
        );
    }
    table.drain_all()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let flows = flows(1000);
    let netflow5 = TemplateManager::netflow5();
    let ipfix = TemplateManager::ipfix(&IpfixConfig::default()).unwrap();

    c.bench_function("encode_netflow5", |b| {
        let encoder = RecordEncoder::new(&netflow5);
        let mut buffer = Vec::with_capacity(flows.len() * encoder.record_length());
        b.iter(|| {
            buffer.clear();
            for (key, record) in flows.iter() {
                encoder.encode_into(key, record, &mut buffer);
            }
        });
    });

    c.bench_function("encode_ipfix", |b| {
        let encoder = RecordEncoder::new(&ipfix);
        let mut buffer = Vec::with_capacity(flows.len() * encoder.record_length());
        b.iter(|| {
            buffer.clear();
            for (key, record) in flows.iter() {
                encoder.encode_into(key, record, &mut buffer);
            }
        });
    });

    c.bench_function("pack_netflow5", |b| {
        let exporter = BatchExporter::new(
            &ExporterConfig::default(),
            &netflow5,
            CapturingSender::new(),
            Arc::new(ExporterStats::default()),
        )
        .unwrap();
        b.iter(|| exporter.pack(&flows));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
