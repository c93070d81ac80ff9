//! Inputs shared by the benchmarks.

/// A named message used as benchmark input.
#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    name: &'static str,
    content: &'static [u8],
}

impl Fixture {
    pub const fn new(name: &'static str, content: &'static [u8]) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

pub static SMALL_GET: Fixture = Fixture::new("small_get", b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

pub static BROWSER_GET: Fixture = Fixture::new(
    "browser_get",
    b"GET /wp-content/uploads/2010/03/hello-kitty-darth-vader-pink.jpg HTTP/1.1\r\n\
      Host: www.kittyhell.com\r\n\
      User-Agent: Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10.6; ja-JP-mac; rv:1.9.2.3) Gecko/20100401 Firefox/3.6.3 Pathtraq/0.9\r\n\
      Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n\
      Accept-Language: ja,en-us;q=0.7,en;q=0.3\r\n\
      Accept-Encoding: gzip,deflate\r\n\
      Accept-Charset: Shift_JIS,utf-8;q=0.7,*;q=0.7\r\n\
      Keep-Alive: 115\r\n\
      Connection: keep-alive\r\n\
      Cookie: wp_ozh_wsa_visits=2; wp_ozh_wsa_visit_lasttime=xxxxxxxxxx; __utma=xxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.x; __utmz=xxxxxxxxx.xxxxxxxxxx.x.x.utmccn=(referral)|utmcsr=reader.livedoor.com|utmcct=/reader/|utmcmd=referral\r\n\
      \r\n",
);

pub static CHUNKED_POST: Fixture = Fixture::new(
    "chunked_post",
    b"POST /upload HTTP/1.1\r\n\
      Host: localhost\r\n\
      Content-Type: application/octet-stream\r\n\
      Transfer-Encoding: chunked\r\n\
      \r\n\
      10;part=1\r\n0123456789abcdef\r\n\
      10;part=2\r\nfedcba9876543210\r\n\
      0\r\n\
      X-Checksum: 00ff\r\n\
      \r\n",
);

pub fn request_fixtures() -> [Fixture; 3] {
    [SMALL_GET, BROWSER_GET, CHUNKED_POST]
}
