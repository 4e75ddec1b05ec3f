pub const APP_NAME: &str = "spark-submit";
pub const SUBMIT_LOG_ENV: &str = "SPARK_SUBMIT_LOG";

// ------------
// labels stamped on every object the submission creates
pub const LABEL_SPARK_APP_NAME: &str = "sparkoperator.k8s.io/app-name";
pub const LABEL_LAUNCHED_BY_OPERATOR: &str = "sparkoperator.k8s.io/launched-by-spark-operator";
pub const LABEL_SUBMISSION_ID: &str = "sparkoperator.k8s.io/submission-id";

// labels Spark itself expects on driver and executor pods
pub const LABEL_SPARK_APP_NAME_NATIVE: &str = "spark-app-name";
pub const LABEL_SPARK_APP_SELECTOR: &str = "spark-app-selector";
pub const LABEL_SPARK_ROLE: &str = "spark-role";
pub const SPARK_ROLE_DRIVER: &str = "driver";

// ------------
// secret mount env synthesis
pub const GOOGLE_APPLICATION_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const GCP_SERVICE_ACCOUNT_JSON_KEY_FILE: &str = "key.json";
pub const HADOOP_TOKEN_FILE_LOCATION_ENV: &str = "HADOOP_TOKEN_FILE_LOCATION";
pub const HADOOP_DELEGATION_TOKEN_FILE: &str = "hadoop.token";

pub const DEFAULT_SPARK_CONF_DIR: &str = "/opt/spark/conf";
pub const SPARK_CONF_DIR_ENV: &str = "SPARK_CONF_DIR";
