mod tests_compliance;
