#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  reason = "Fine in benchmarks"
)]
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use folio_markdown::{
  Processor,
  ProcessorOptions,
  parse_document,
  syntax::create_builtin_manager,
};

const POST_SMALL: &str = r#"---
title: Small post
tags: [rust]
---

# Small post

Some *emphasis*, a [link](./next.md) and `inline code`.
"#;

const POST_LARGE: &str = r#"---
title: "Understanding the Event Loop"
slug: event-loop
tags: [javascript, node, internals]
cover: ./cover.png
datePublished: 2021-03-14
---

# Understanding the Event Loop

The event loop is what allows **Node.js** to perform *non-blocking* I/O
operations despite the fact that JavaScript is single-threaded.

## Phases

1. timers
2. pending callbacks
3. poll
4. check

> Each phase has a FIFO queue of callbacks to execute.

```ts
import { readFile } from "node:fs/promises";

// Read a file without blocking the loop
async function main(): Promise<void> {
  const data = await readFile("./package.json", "utf8");
  console.log(JSON.parse(data).name);
}

main().catch((err) => {
  console.error(err);
  process.exit(1);
});
```

| Phase  | Runs                     |
|:-------|:-------------------------|
| timers | `setTimeout` callbacks   |
| check  | `setImmediate` callbacks |

![Diagram of the loop](./images/loop.png "The loop")

<iframe src="https://www.youtube.com/embed/8aGhZQkoFbQ" width="560" height="315" allowfullscreen></iframe>

<Callout type="warning">
Never block the loop with synchronous work.
</Callout>

```bash
$ node --trace-event-categories v8 app.js # record a trace
```
"#;

fn bench_parse(c: &mut Criterion) {
  let mut group = c.benchmark_group("parse");

  group.bench_with_input(BenchmarkId::new("document", "small"), &POST_SMALL, |b, post| {
    b.iter(|| parse_document(black_box(post)).unwrap());
  });

  group.bench_with_input(BenchmarkId::new("document", "large"), &POST_LARGE, |b, post| {
    b.iter(|| parse_document(black_box(post)).unwrap());
  });

  group.finish();
}

fn bench_render(c: &mut Criterion) {
  let mut group = c.benchmark_group("render");

  let plain = Processor::new(ProcessorOptions {
    highlight_code: false,
    ..Default::default()
  });
  let highlighted = Processor::new(ProcessorOptions::default());

  for (name, post) in [("small", POST_SMALL), ("large", POST_LARGE)] {
    group.bench_with_input(BenchmarkId::new("plain", name), &post, |b, post| {
      b.iter(|| plain.render(black_box(post)).unwrap());
    });
    group.bench_with_input(BenchmarkId::new("highlighted", name), &post, |b, post| {
      b.iter(|| highlighted.render(black_box(post)).unwrap());
    });
  }

  group.finish();
}

fn bench_highlight(c: &mut Criterion) {
  let manager = create_builtin_manager();
  let code = POST_LARGE
    .split("```ts\n")
    .nth(1)
    .and_then(|rest| rest.split("```").next())
    .expect("benchmark post has a ts block");

  c.bench_function("highlight_builtin_ts", |b| {
    b.iter(|| manager.highlight(black_box(code), Some("ts")));
  });
}

criterion_group!(benches, bench_parse, bench_render, bench_highlight);
criterion_main!(benches);
