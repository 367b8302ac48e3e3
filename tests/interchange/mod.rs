mod tests_json;
mod tests_roundtrip;
mod tests_xml;
