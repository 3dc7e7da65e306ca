mod stub_server;
